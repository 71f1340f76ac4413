//! OpenAI-compatible completion backend.

pub mod backend;
pub mod streaming;
pub mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use streaming::{parse_sse_stream, StreamingCompletion, TokenStream};
