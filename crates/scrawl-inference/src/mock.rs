//! Mock completion backend for deterministic testing.
//!
//! Scripts replies keyed by the last user message, records every call for
//! assertion, and streams by splitting the scripted reply into fixed-size
//! chunks.
//!
//! ## Usage
//!
//! ```rust
//! use scrawl_core::{ChatMessage, CompletionBackend};
//! use scrawl_inference::mock::MockChatBackend;
//!
//! # #[tokio::main] async fn main() {
//! let backend = MockChatBackend::new().with_reply("scripted reply");
//! let messages = vec![ChatMessage::user("anything")];
//! assert_eq!(backend.complete(&messages).await.unwrap(), "scripted reply");
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use scrawl_core::{ChatMessage, CompletionBackend, Error, Result};

use crate::openai::streaming::{StreamingCompletion, TokenStream};
use crate::ChatBackend;

/// Mock completion backend for testing.
#[derive(Clone)]
pub struct MockChatBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    default_reply: String,
    scripted_replies: HashMap<String, String>,
    title_reply: String,
    stream_chunk_len: usize,
    fail: bool,
}

/// One recorded backend invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            default_reply: "Mock reply".to_string(),
            scripted_replies: HashMap::new(),
            title_reply: "Mock Title".to_string(),
            stream_chunk_len: 4,
            fail: false,
        }
    }
}

impl Default for MockChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChatBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the reply returned for any unscripted input.
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_reply = reply.into();
        self
    }

    /// Script a reply for a specific last-user-message content.
    pub fn with_reply_for(mut self, input: impl Into<String>, reply: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .scripted_replies
            .insert(input.into(), reply.into());
        self
    }

    /// Set the reply returned by title summarization.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).title_reply = title.into();
        self
    }

    /// Set the character length of streamed chunks.
    pub fn with_chunk_len(mut self, len: usize) -> Self {
        Arc::make_mut(&mut self.config).stream_chunk_len = len.max(1);
        self
    }

    /// Make every operation fail, for error-path testing.
    pub fn with_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    /// Get all logged calls for assertion.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls to a given operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn record(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    fn last_user(messages: &[ChatMessage]) -> &str {
        messages
            .iter()
            .rev()
            .find(|m| m.role == scrawl_core::MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    fn reply_for(&self, input: &str) -> String {
        self.config
            .scripted_replies
            .get(input)
            .cloned()
            .unwrap_or_else(|| self.config.default_reply.clone())
    }
}

#[async_trait]
impl CompletionBackend for MockChatBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let input = Self::last_user(messages);
        self.record("complete", input);
        if self.config.fail {
            return Err(Error::Completion("mock failure".to_string()));
        }
        Ok(self.reply_for(input))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[async_trait]
impl StreamingCompletion for MockChatBackend {
    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        let input = Self::last_user(messages);
        self.record("complete_stream", input);
        if self.config.fail {
            return Err(Error::Completion("mock failure".to_string()));
        }

        let reply = self.reply_for(input);
        let chars: Vec<char> = reply.chars().collect();
        let chunks: Vec<Result<String>> = chars
            .chunks(self.config.stream_chunk_len)
            .map(|c| Ok(c.iter().collect()))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn health_check(&self) -> Result<bool> {
        Ok(!self.config.fail)
    }

    async fn complete_title(&self, prompt: &str) -> Result<String> {
        self.record("complete_title", prompt);
        if self.config.fail {
            return Err(Error::Completion("mock failure".to_string()));
        }
        Ok(self.config.title_reply.clone())
    }
}
