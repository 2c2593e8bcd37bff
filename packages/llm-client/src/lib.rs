//! Chat clients for hosted LLM APIs.
//!
//! Two providers are supported:
//! - any OpenAI-compatible `/chat/completions` endpoint (Z.ai's GLM models by
//!   default) via [`OpenAiCompatClient`]
//! - Google Gemini via [`GeminiClient`]
//!
//! Both take the same [`ChatRequest`] and return a [`ChatResponse`].
//!
//! # Example
//!
//! ```rust,ignore
//! use llm_client::{ChatRequest, Message, OpenAiCompatClient};
//!
//! let client = OpenAiCompatClient::zai(api_key);
//! let response = client
//!     .chat_completion(ChatRequest::new("glm-4.5").message(Message::user("Hello!")))
//!     .await?;
//! ```

pub mod error;
pub mod gemini;
pub mod types;

pub use error::{LlmError, Result};
pub use gemini::GeminiClient;
pub use types::*;

use reqwest::Client;
use tracing::{debug, warn};

pub const ZAI_BASE_URL: &str = "https://api.z.ai/api/paas/v4";

/// Client for OpenAI-compatible chat completion APIs.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Client pointed at Z.ai's public endpoint.
    pub fn zai(api_key: impl Into<String>) -> Self {
        Self::new(api_key, ZAI_BASE_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        if request.messages.is_empty() {
            return Err(LlmError::Config("chat request has no messages".into()));
        }

        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!(
                "{}/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Chat completion request failed");
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Chat completion API error");
            return Err(LlmError::Api(format!(
                "chat completion error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::Empty("no choices in completion".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "Chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: chat_response.usage,
        })
    }
}
