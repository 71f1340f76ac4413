//! # scrawl-inference
//!
//! Model completion backend for the scrawl chat panel.
//!
//! This crate provides:
//! - The combined [`ChatBackend`] boundary the API server depends on
//! - An OpenAI-compatible implementation (one-shot and token streaming)
//! - A scripted mock backend for tests (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use scrawl_core::{ChatMessage, CompletionBackend};
//! use scrawl_inference::OpenAIBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::from_env().unwrap();
//!     let messages = vec![ChatMessage::user("Hello".to_string())];
//!     let reply = backend.complete(&messages).await.unwrap();
//!     println!("{}", reply);
//! }
//! ```

use async_trait::async_trait;

pub mod openai;

// Mock completion backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use scrawl_core::*;

pub use openai::{parse_sse_stream, OpenAIBackend, OpenAIConfig, StreamingCompletion, TokenStream};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockChatBackend;

/// Combined backend surface: one-shot and streaming completions plus the
/// transcript-title summarization path.
#[async_trait]
pub trait ChatBackend: CompletionBackend + StreamingCompletion {
    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool>;

    /// One-shot completion on the title model, used to summarize a transcript
    /// into a short title.
    async fn complete_title(&self, prompt: &str) -> Result<String>;
}
