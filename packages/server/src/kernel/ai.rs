// Chat model implementations (Z.ai, Gemini)
//
// Infrastructure implementations of BaseChatModel.
// Business logic (prompting, context) lives in domains/chat.

use anyhow::{Context, Result};
use async_trait::async_trait;
use llm_client::{ChatRequest, GeminiClient, Message, OpenAiCompatClient};

use super::BaseChatModel;
use crate::config::{ChatProvider, Config};

const TEMPERATURE: f32 = 0.4;
const MAX_TOKENS: u32 = 1024;

/// Z.ai GLM models over the OpenAI-compatible API
pub struct ZaiChatModel {
    client: OpenAiCompatClient,
    model: String,
}

impl ZaiChatModel {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: OpenAiCompatClient::new(api_key, base_url),
            model,
        }
    }
}

#[async_trait]
impl BaseChatModel for ZaiChatModel {
    fn provider(&self) -> &'static str {
        "zai"
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .messages(messages)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS);

        let response = self
            .client
            .chat_completion(request)
            .await
            .context("Z.ai chat completion failed")?;

        Ok(response.content)
    }
}

/// Google Gemini via generateContent
pub struct GeminiChatModel {
    client: GeminiClient,
    model: String,
}

impl GeminiChatModel {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: GeminiClient::new(api_key),
            model,
        }
    }
}

#[async_trait]
impl BaseChatModel for GeminiChatModel {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .messages(messages)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS);

        let response = self
            .client
            .chat_completion(request)
            .await
            .context("Gemini chat completion failed")?;

        Ok(response.content)
    }
}

/// Build the configured chat model, if any provider has a key
pub fn create_chat_model(config: &Config) -> Option<std::sync::Arc<dyn BaseChatModel>> {
    match config.chat_provider? {
        ChatProvider::Zai => {
            let Some(key) = config.zai_api_key.clone() else {
                tracing::warn!("CHAT_PROVIDER=zai but ZAI_API_KEY is not set; chat disabled");
                return None;
            };
            Some(std::sync::Arc::new(ZaiChatModel::new(
                key,
                config.zai_base_url.clone(),
                config.zai_model.clone(),
            )))
        }
        ChatProvider::Gemini => {
            let Some(key) = config.gemini_api_key.clone() else {
                tracing::warn!("CHAT_PROVIDER=gemini but GEMINI_API_KEY is not set; chat disabled");
                return None;
            };
            Some(std::sync::Arc::new(GeminiChatModel::new(
                key,
                config.gemini_model.clone(),
            )))
        }
    }
}
