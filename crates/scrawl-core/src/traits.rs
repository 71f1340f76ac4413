//! Core traits for scrawl abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable storage and model backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChatMessage, ChatSummary, ChatTranscript};

// =============================================================================
// STORE TRAITS
// =============================================================================

/// Durable storage for the singleton note record.
///
/// Treated as a reliable key-value store; no transactionality is required
/// between a read and a write.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Read the persisted note content.
    async fn read_note(&self) -> Result<String>;

    /// Overwrite the persisted note content.
    async fn write_note(&self, content: &str) -> Result<()>;
}

/// Durable storage for chat transcripts.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Create an empty transcript with the placeholder title, returning its id.
    async fn create(&self) -> Result<i64>;

    /// Fetch a full transcript by id.
    async fn fetch(&self, id: i64) -> Result<ChatTranscript>;

    /// List all transcripts, newest first.
    async fn list(&self) -> Result<Vec<ChatSummary>>;

    /// Append one completed user/assistant exchange to a transcript.
    async fn append_exchange(
        &self,
        id: i64,
        user: ChatMessage,
        assistant: ChatMessage,
    ) -> Result<()>;

    /// Replace a transcript's title.
    async fn update_title(&self, id: i64, title: &str) -> Result<()>;
}

// =============================================================================
// MODEL SERVICE TRAITS
// =============================================================================

/// One-shot text completion over a message history.
///
/// The streaming variant lives with the backend implementations; this is the
/// minimal surface the rest of the system depends on.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run the conversation through the model and return the final reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
