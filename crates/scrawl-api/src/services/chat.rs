//! Chat exchange orchestration over the transcript store and model backend.

use std::sync::Arc;

use tracing::{debug, warn};

use scrawl_core::{defaults, ChatMessage, ChatStore, ChatSummary, ChatTranscript, Result};
use scrawl_inference::{ChatBackend, TokenStream};

/// Runs chat exchanges: streams the model's reply over the transcript history,
/// persists completed exchanges, and backfills placeholder titles.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ChatStore>,
    backend: Arc<dyn ChatBackend>,
}

impl ChatService {
    pub fn new(store: Arc<dyn ChatStore>, backend: Arc<dyn ChatBackend>) -> Self {
        Self { store, backend }
    }

    /// Create an empty transcript, returning its id.
    pub async fn create(&self) -> Result<i64> {
        self.store.create().await
    }

    /// List transcripts, newest first.
    pub async fn list(&self) -> Result<Vec<ChatSummary>> {
        self.store.list().await
    }

    /// Fetch a full transcript.
    pub async fn fetch(&self, id: i64) -> Result<ChatTranscript> {
        self.store.fetch(id).await
    }

    /// Start a streaming exchange: the stored history plus the new user
    /// message goes to the model; tokens come back as they are generated.
    ///
    /// Nothing is persisted yet — the transcript only changes once the
    /// exchange completes and [`ChatService::finish_exchange`] runs.
    pub async fn open_stream(&self, chat_id: i64, user_message: &str) -> Result<TokenStream> {
        let transcript = self.store.fetch(chat_id).await?;
        debug!(
            subsystem = "api",
            component = "chat",
            chat_id,
            history = transcript.messages.len(),
            "Opening completion stream"
        );
        let mut messages = transcript.messages;
        messages.push(ChatMessage::user(user_message));
        self.backend.complete_stream(&messages).await
    }

    /// Persist a completed exchange; summarize a title if still the
    /// placeholder. Title failures are logged and swallowed — the exchange
    /// itself is already durable.
    pub async fn finish_exchange(
        &self,
        chat_id: i64,
        user_message: String,
        reply: String,
    ) -> Result<()> {
        let was_untitled = self.store.fetch(chat_id).await?.is_untitled();
        self.store
            .append_exchange(
                chat_id,
                ChatMessage::user(user_message),
                ChatMessage::assistant(reply.clone()),
            )
            .await?;

        if was_untitled {
            let prompt = format!("{}{}", defaults::TITLE_PROMPT_PREFIX, reply);
            match self.backend.complete_title(&prompt).await {
                Ok(title) if !title.is_empty() => {
                    self.store.update_title(chat_id, &title).await?;
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(
                        subsystem = "api",
                        component = "chat",
                        chat_id,
                        error = %error,
                        "Title summarization failed"
                    );
                }
            }
        }
        Ok(())
    }
}
