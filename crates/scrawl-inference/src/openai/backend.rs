//! OpenAI-compatible completion backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use scrawl_core::{ChatMessage, CompletionBackend, Error, Result};

use crate::ChatBackend;

use super::streaming::{parse_sse_stream, StreamingCompletion, TokenStream};
use super::types::*;

/// Default OpenAI API endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default conversation model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default model for summarizing transcripts into titles.
pub const DEFAULT_TITLE_MODEL: &str = "gpt-4o-mini";

/// Default timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model used for chat conversations.
    pub chat_model: String,
    /// Model used for title summarization.
    pub title_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Skip TLS verification (for self-signed certs in local environments).
    pub skip_tls_verify: bool,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            title_model: DEFAULT_TITLE_MODEL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            skip_tls_verify: false,
        }
    }
}

/// OpenAI-compatible completion backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_seconds));

        if config.skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Completion(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            chat_model = %config.chat_model,
            title_model = %config.title_model,
            "Initializing completion backend"
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OpenAIConfig::default())
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = OpenAIConfig {
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            chat_model: std::env::var("OPENAI_CHAT_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            title_model: std::env::var("OPENAI_TITLE_MODEL")
                .unwrap_or_else(|_| DEFAULT_TITLE_MODEL.to_string()),
            timeout_seconds: std::env::var("OPENAI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            skip_tls_verify: std::env::var("OPENAI_SKIP_TLS_VERIFY")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(false),
        };

        Self::new(config)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Issue a chat-completions request, mapping non-success statuses to
    /// decoded API errors.
    async fn chat_request(
        &self,
        model: &str,
        messages: Vec<WireMessage>,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            temperature: None,
            max_tokens: None,
            stream,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref api_key) = self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Completion(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ApiErrorResponse>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Completion(format!(
                "Backend returned {}: {}",
                status, message
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionBackend for OpenAIBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(
            subsystem = "inference",
            component = "openai",
            op = "complete",
            model = %self.config.chat_model,
            messages = messages.len(),
            "Running completion"
        );

        let wire = messages.iter().map(WireMessage::from).collect();
        let response = self
            .chat_request(&self.config.chat_model, wire, false)
            .await?;

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!(
            subsystem = "inference",
            component = "openai",
            content_len = content.len(),
            "Completion finished"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.chat_model
    }
}

#[async_trait]
impl StreamingCompletion for OpenAIBackend {
    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        debug!(
            subsystem = "inference",
            component = "openai",
            op = "complete_stream",
            model = %self.config.chat_model,
            messages = messages.len(),
            "Running streaming completion"
        );

        let wire = messages.iter().map(WireMessage::from).collect();
        let response = self
            .chat_request(&self.config.chat_model, wire, true)
            .await?;

        Ok(parse_sse_stream(response.bytes_stream()))
    }
}

#[async_trait]
impl ChatBackend for OpenAIBackend {
    async fn health_check(&self) -> Result<bool> {
        // Minimal probe against the models listing endpoint.
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        let mut builder = self.client.get(&url).timeout(Duration::from_secs(5));
        if let Some(ref api_key) = self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        match builder.send().await {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                warn!(
                    subsystem = "inference",
                    component = "openai",
                    status = %resp.status(),
                    "Backend health check failed"
                );
                Ok(false)
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "openai",
                    error = %e,
                    "Backend health check error"
                );
                Ok(false)
            }
        }
    }

    async fn complete_title(&self, prompt: &str) -> Result<String> {
        let response = self
            .chat_request(&self.config.title_model, vec![WireMessage::user(prompt)], false)
            .await?;

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("Failed to parse response: {}", e)))?;

        Ok(result
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default())
    }
}
