//! Google Gemini `generateContent` client.
//!
//! Gemini does not speak the OpenAI chat format: system prompts travel in
//! `systemInstruction`, the assistant role is called `model`, and each turn
//! is a list of `parts`. [`GenerateContentRequest::from_chat`] does the
//! reshaping.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LlmError, Result};
use crate::types::{ChatRequest, ChatResponse, Role, Usage};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Reshape a chat request into Gemini's wire format.
    ///
    /// System messages are joined into `systemInstruction`. Consecutive turns
    /// from the same author are merged, and leading assistant turns are
    /// dropped because a conversation must open with a user turn.
    pub fn from_chat(request: &ChatRequest) -> Self {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let mut contents: Vec<Content> = Vec::new();
        for message in request.messages.iter().filter(|m| m.role != Role::System) {
            let role = match message.role {
                Role::User => "user",
                _ => "model",
            };

            if contents.is_empty() && role == "model" {
                continue;
            }

            match contents.last_mut() {
                Some(last) if last.role.as_deref() == Some(role) => {
                    last.parts.push(Part {
                        text: message.content.clone(),
                    });
                }
                _ => contents.push(Content {
                    role: Some(role.to_string()),
                    parts: vec![Part {
                        text: message.content.clone(),
                    }],
                }),
            }
        }

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        Self {
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: system.join("\n\n"),
                }],
            }),
            contents,
            generation_config,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub(crate) fn into_chat_response(self) -> Result<ChatResponse> {
        let usage = self.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Empty("Gemini returned no candidates".into()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::Empty(format!(
                "Gemini candidate had no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(ChatResponse {
            content: text,
            usage,
        })
    }
}

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Chat completion via `models/{model}:generateContent`.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();
        let body = GenerateContentRequest::from_chat(&request);

        if body.contents.is_empty() {
            return Err(LlmError::Config(
                "Gemini request needs at least one user message".into(),
            ));
        }

        let response = self
            .http_client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url.trim_end_matches('/'),
                request.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Gemini API error");
            return Err(LlmError::Api(format!("Gemini API error: {}", error_text)));
        }

        let raw: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "Gemini chat completion"
        );

        raw.into_chat_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[test]
    fn test_reshape_moves_system_and_renames_roles() {
        let request = ChatRequest::new("gemini-1.5-flash")
            .message(Message::system("Be calm."))
            .message(Message::user("Is there a shelter nearby?"))
            .message(Message::assistant("Which city are you in?"))
            .message(Message::user("Duluth"));

        let body = serde_json::to_value(GenerateContentRequest::from_chat(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be calm.");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "Duluth");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_reshape_merges_and_drops_leading_model_turns() {
        let request = ChatRequest::new("m")
            .message(Message::assistant("Hello! How can I help?"))
            .message(Message::user("Flood"))
            .message(Message::user("in my basement"))
            .temperature(0.3);

        let body = GenerateContentRequest::from_chat(&request);

        assert_eq!(body.contents.len(), 1);
        assert_eq!(body.contents[0].parts.len(), 2);
        assert!(body.system_instruction.is_none());
        assert_eq!(
            body.generation_config,
            Some(GenerationConfig {
                temperature: Some(0.3),
                max_output_tokens: None
            })
        );
    }

    #[test]
    fn test_response_concatenates_parts() {
        let raw: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Move to "}, {"text": "higher ground."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 4, "totalTokenCount": 9}
        }))
        .unwrap();

        let response = raw.into_chat_response().unwrap();
        assert_eq!(response.content, "Move to higher ground.");
        assert_eq!(response.usage.unwrap().total_tokens, 9);
    }

    #[test]
    fn test_blocked_response_is_empty_error() {
        let raw: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();

        let err = raw.into_chat_response().unwrap_err();
        assert!(matches!(err, LlmError::Empty(ref m) if m.contains("SAFETY")));
    }
}
