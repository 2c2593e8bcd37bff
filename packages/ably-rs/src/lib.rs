//! Minimal Ably REST client.
//!
//! Covers the two operations a backend needs: publishing a message to a
//! channel, and signing token requests that browsers exchange for a
//! short-lived token (so the API key secret stays on the server).
//!
//! ```rust,ignore
//! let ably = AblyService::new(AblyOptions::from_key("appId.keyId:secret")?);
//! ably.publish("alerts", "new-alert", &serde_json::json!({"title": "M5.1"})).await?;
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::{debug, warn};

pub mod error;
pub mod models;

pub use error::{AblyError, Result};
pub use models::{Capability, PublishResponse, TokenParams, TokenRequest};

use models::OutgoingMessage;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_REST_HOST: &str = "https://rest.ably.io";

#[derive(Debug, Clone)]
pub struct AblyOptions {
    pub key_name: String,
    pub key_secret: String,
    pub rest_host: String,
}

impl AblyOptions {
    /// Parse an API key of the form `keyName:keySecret`.
    pub fn from_key(api_key: &str) -> Result<Self> {
        let (key_name, key_secret) = api_key
            .trim()
            .split_once(':')
            .ok_or_else(|| AblyError::Config("API key must be `keyName:keySecret`".into()))?;

        if key_name.is_empty() || key_secret.is_empty() {
            return Err(AblyError::Config("API key has an empty part".into()));
        }

        Ok(Self {
            key_name: key_name.to_string(),
            key_secret: key_secret.to_string(),
            rest_host: DEFAULT_REST_HOST.to_string(),
        })
    }

    pub fn with_rest_host(mut self, host: impl Into<String>) -> Self {
        self.rest_host = host.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct AblyService {
    options: AblyOptions,
    client: Client,
}

impl AblyService {
    pub fn new(options: AblyOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    pub fn key_name(&self) -> &str {
        &self.options.key_name
    }

    /// Publish a single message to a channel.
    pub async fn publish(
        &self,
        channel: &str,
        name: &str,
        data: &serde_json::Value,
    ) -> Result<PublishResponse> {
        let url = format!(
            "{}/channels/{}/messages",
            self.options.rest_host.trim_end_matches('/'),
            urlencoding::encode(channel)
        );

        debug!(channel = %channel, event = %name, "Publishing to Ably");

        let response = self
            .client
            .post(url)
            .basic_auth(&self.options.key_name, Some(&self.options.key_secret))
            .json(&OutgoingMessage { name, data })
            .send()
            .await
            .map_err(|e| AblyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Ably publish rejected");
            return Err(AblyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json::<PublishResponse>()
            .await
            .map_err(|e| AblyError::Parse(e.to_string()))
    }

    /// Create a signed token request using the current time and a random nonce.
    pub fn create_token_request(&self, params: TokenParams) -> Result<TokenRequest> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AblyError::Config(format!("system clock before epoch: {}", e)))?
            .as_millis() as u64;
        let nonce = uuid::Uuid::new_v4().simple().to_string();

        self.sign_token_request(params, timestamp, nonce)
    }

    /// Sign a token request with an explicit timestamp and nonce.
    ///
    /// The signed text is `keyName\nttl\ncapability\nclientId\ntimestamp\nnonce\n`,
    /// with absent optional fields as empty lines.
    pub fn sign_token_request(
        &self,
        params: TokenParams,
        timestamp: u64,
        nonce: String,
    ) -> Result<TokenRequest> {
        let capability = params
            .capability
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AblyError::Parse(e.to_string()))?;

        let sign_text = format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n",
            self.options.key_name,
            params.ttl_ms.map(|t| t.to_string()).unwrap_or_default(),
            capability.as_deref().unwrap_or(""),
            params.client_id.as_deref().unwrap_or(""),
            timestamp,
            nonce,
        );

        let mut mac = HmacSha256::new_from_slice(self.options.key_secret.as_bytes())
            .map_err(|e| AblyError::Config(format!("invalid key secret: {}", e)))?;
        mac.update(sign_text.as_bytes());
        let mac = STANDARD.encode(mac.finalize().into_bytes());

        Ok(TokenRequest {
            key_name: self.options.key_name.clone(),
            ttl: params.ttl_ms,
            capability,
            client_id: params.client_id,
            timestamp,
            nonce,
            mac,
        })
    }
}
