use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Channel → operations map, e.g. `{"alerts": ["subscribe"]}`.
///
/// Kept ordered so the serialized form (which is part of the signed text)
/// is deterministic.
pub type Capability = BTreeMap<String, Vec<String>>;

/// Parameters for a token request issued on behalf of a client.
#[derive(Debug, Clone, Default)]
pub struct TokenParams {
    pub client_id: Option<String>,
    pub capability: Option<Capability>,
    /// Requested token lifetime in milliseconds.
    pub ttl_ms: Option<u64>,
}

/// A signed token request. Clients exchange it with Ably for a token, so the
/// API key secret never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub key_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub timestamp: u64,
    pub nonce: String,
    pub mac: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OutgoingMessage<'a> {
    pub name: &'a str,
    pub data: &'a serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishResponse {
    #[serde(rename = "channel")]
    pub channel: Option<String>,
    #[serde(rename = "messageId")]
    pub message_id: Option<String>,
}
