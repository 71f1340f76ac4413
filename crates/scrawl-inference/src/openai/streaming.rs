//! SSE stream parsing for OpenAI-compatible streaming responses.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

use scrawl_core::{ChatMessage, Error, Result};

use super::types::CompletionChunk;

/// Stream of generated text tokens. Finite, not restartable.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Streaming variant of the completion boundary.
#[async_trait]
pub trait StreamingCompletion: Send + Sync {
    /// Run the conversation through the model, yielding partial text as it
    /// arrives.
    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream>;
}

/// What one transport chunk contributed to the token stream.
enum ChunkContent {
    Text(String),
    Nothing,
}

/// Adapt a raw SSE byte stream into a token stream.
///
/// Each transport chunk may carry several `data:` events; their deltas are
/// concatenated into one yielded token. The `[DONE]` sentinel and comment
/// lines contribute nothing. Events split across transport chunks are not
/// reassembled.
pub fn parse_sse_stream(
    stream: impl Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> TokenStream {
    let tokens = stream
        .map(|chunk| chunk.map_err(|e| Error::Completion(format!("Stream error: {}", e))))
        .filter_map(|result| async move {
            match result {
                Ok(bytes) => match scan_chunk(&String::from_utf8_lossy(&bytes)) {
                    Ok(ChunkContent::Text(text)) => Some(Ok(text)),
                    Ok(ChunkContent::Nothing) => None,
                    Err(e) => Some(Err(e)),
                },
                Err(e) => Some(Err(e)),
            }
        });

    Box::pin(tokens)
}

/// Collect the delta text carried by one transport chunk.
fn scan_chunk(raw: &str) -> Result<ChunkContent> {
    let mut text = String::new();

    for line in raw.lines() {
        let line = line.trim();

        // Blank separators and SSE comments
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };

        // End-of-stream sentinel; anything already collected still counts.
        if data == "[DONE]" {
            break;
        }

        let chunk: CompletionChunk = serde_json::from_str(data)
            .map_err(|e| Error::Completion(format!("Malformed stream chunk: {}", e)))?;
        for choice in chunk.choices {
            if let Some(content) = choice.delta.content {
                text.push_str(&content);
            }
        }
    }

    if text.is_empty() {
        Ok(ChunkContent::Nothing)
    } else {
        Ok(ChunkContent::Text(text))
    }
}
