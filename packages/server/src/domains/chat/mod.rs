//! Chat domain - disaster-preparedness assistant over a hosted LLM.

pub mod prompt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::{ApiError, ApiResult};
use crate::domains::directory::Contact;
use crate::kernel::ServerDeps;

pub const MAX_MESSAGE_CHARS: usize = 4_000;
pub const MAX_HISTORY_TURNS: usize = 20;
pub const SUGGESTED_CONTACTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryTurn {
    pub role: HistoryRole,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub provider: String,
    pub suggested_contacts: Vec<Contact>,
}

pub fn validate_message(message: &str) -> ApiResult<&str> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::bad_request(format!(
            "message must be at most {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(message)
}

/// Last `MAX_HISTORY_TURNS` non-empty turns as model messages
pub fn trim_history(history: Vec<HistoryTurn>) -> Vec<llm_client::Message> {
    let turns: Vec<HistoryTurn> = history
        .into_iter()
        .filter(|t| !t.content.trim().is_empty())
        .collect();
    let skip = turns.len().saturating_sub(MAX_HISTORY_TURNS);

    turns
        .into_iter()
        .skip(skip)
        .map(|t| match t.role {
            HistoryRole::User => llm_client::Message::user(t.content),
            HistoryRole::Assistant => llm_client::Message::assistant(t.content),
        })
        .collect()
}

pub async fn chat(request: ChatRequest, deps: &ServerDeps) -> ApiResult<ChatReply> {
    let message = validate_message(&request.message)?;

    let Some(model) = deps.chat_model.as_ref() else {
        return Err(ApiError::Unavailable(
            "chat assistant is not configured".to_string(),
        ));
    };

    let suggested_contacts: Vec<Contact> = deps
        .directory
        .search_contacts(message, SUGGESTED_CONTACTS)
        .into_iter()
        .filter(|m| m.score > 0)
        .map(|m| m.entry)
        .collect();

    let conversation = prompt::build_conversation(
        &suggested_contacts,
        trim_history(request.history),
        message,
    );

    let reply = model.complete(conversation).await.map_err(|e| {
        warn!(error = %e, provider = model.provider(), "Chat completion failed");
        ApiError::Upstream("chat provider request failed".to_string())
    })?;

    info!(
        provider = model.provider(),
        contacts = suggested_contacts.len(),
        "Chat reply generated"
    );

    Ok(ChatReply {
        reply,
        provider: model.provider().to_string(),
        suggested_contacts,
    })
}
