// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "aggregate supplies by region") lives in domain
// functions that take these traits.
//
// Naming convention: Base* for trait names (e.g., BaseGeocoder, BaseChatModel)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Real-time Publisher Trait (Infrastructure - Ably)
// =============================================================================

#[async_trait]
pub trait BaseRealtimePublisher: Send + Sync {
    /// Publish an event on a channel
    async fn publish(&self, channel: &str, event: &str, payload: serde_json::Value) -> Result<()>;

    /// Sign a token request so a browser can connect as `client_id`
    fn create_token_request(
        &self,
        client_id: &str,
        capability: ably::Capability,
        ttl_ms: u64,
    ) -> Result<ably::TokenRequest>;
}

// =============================================================================
// Chat Model Trait (Infrastructure - hosted LLM)
// =============================================================================

#[async_trait]
pub trait BaseChatModel: Send + Sync {
    /// Short provider name reported back to clients ("zai", "gemini")
    fn provider(&self) -> &'static str;

    /// Complete a conversation (system + history + latest user turn)
    async fn complete(&self, messages: Vec<llm_client::Message>) -> Result<String>;
}

// =============================================================================
// Geocoder Trait (Infrastructure - Nominatim)
// =============================================================================

#[async_trait]
pub trait BaseGeocoder: Send + Sync {
    /// Reverse-geocode coordinates to a human region label
    /// ("Duluth, Minnesota"). `Ok(None)` when nothing is known there.
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<String>>;
}

// =============================================================================
// Earthquake Feed Trait (Infrastructure - USGS)
// =============================================================================

/// One earthquake from the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeEvent {
    /// Stable feed id (e.g. "us7000abcd")
    pub id: String,
    pub magnitude: Option<f64>,
    pub place: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: Option<f64>,
    pub url: Option<String>,
}

#[async_trait]
pub trait BaseEarthquakeFeed: Send + Sync {
    async fn fetch_recent(&self) -> Result<Vec<QuakeEvent>>;
}

// =============================================================================
// Auth Provider Trait (Infrastructure - Supabase GoTrue)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: AuthIdentity,
}

/// Sign-up result. `session` is `None` when the project requires email
/// confirmation before the first login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignUpOutcome {
    pub user: AuthIdentity,
    pub session: Option<AuthSession>,
}

#[derive(Debug, Error)]
pub enum AuthProviderError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The provider refused the input (duplicate user, weak password, ...)
    #[error("{0}")]
    Rejected(String),

    #[error("Auth provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait BaseAuthProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<SignUpOutcome, AuthProviderError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError>;

    /// Revoke the session behind an access token
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError>;
}
