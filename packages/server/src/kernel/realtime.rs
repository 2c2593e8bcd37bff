//! Real-time fan-out through Ably, plus a recording publisher for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use ably::{AblyOptions, AblyService, Capability, TokenParams, TokenRequest};

use super::BaseRealtimePublisher;

/// Channel names and event names used across domains.
pub mod channels {
    use uuid::Uuid;

    pub const ALERTS: &str = "alerts";
    pub const PINS: &str = "pins";

    pub const EVENT_NEW_ALERT: &str = "new-alert";
    pub const EVENT_PIN_UPDATED: &str = "pin-updated";
    pub const EVENT_NOTIFICATION: &str = "notification";
    pub const EVENT_SAFETY_CHECK: &str = "safety-check";
    pub const EVENT_SAFETY_STATUS: &str = "safety-status";
    pub const EVENT_LOCATION_UPDATED: &str = "location-updated";

    /// Private per-user channel
    pub fn user(user_id: Uuid) -> String {
        format!("user:{}", user_id)
    }
}

/// Capability granted to a signed-in browser client
pub fn client_capability(user_id: Uuid) -> Capability {
    let mut capability = Capability::new();
    capability.insert(channels::ALERTS.to_string(), vec!["subscribe".to_string()]);
    capability.insert(channels::PINS.to_string(), vec!["subscribe".to_string()]);
    capability.insert(
        channels::user(user_id),
        vec!["subscribe".to_string(), "presence".to_string()],
    );
    capability
}

// =============================================================================
// Ably publisher
// =============================================================================

pub struct AblyPublisher {
    service: AblyService,
}

impl AblyPublisher {
    pub fn new(service: AblyService) -> Self {
        Self { service }
    }

    pub fn from_key(api_key: &str) -> Result<Self> {
        Ok(Self::new(AblyService::new(AblyOptions::from_key(api_key)?)))
    }
}

#[async_trait]
impl BaseRealtimePublisher for AblyPublisher {
    async fn publish(&self, channel: &str, event: &str, payload: serde_json::Value) -> Result<()> {
        self.service.publish(channel, event, &payload).await?;
        Ok(())
    }

    fn create_token_request(
        &self,
        client_id: &str,
        capability: Capability,
        ttl_ms: u64,
    ) -> Result<TokenRequest> {
        Ok(self.service.create_token_request(TokenParams {
            client_id: Some(client_id.to_string()),
            capability: Some(capability),
            ttl_ms: Some(ttl_ms),
        })?)
    }
}

// =============================================================================
// Test publisher
// =============================================================================

/// A published message.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub channel: String,
    pub event: String,
    pub payload: serde_json::Value,
}

/// Records published messages instead of sending them.
///
/// Token requests are signed for real with a fixed test key so their shape
/// matches production.
pub struct TestRealtime {
    published: RwLock<Vec<PublishedMessage>>,
    signer: AblyService,
    fail_publishes: bool,
}

impl Default for TestRealtime {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRealtime {
    pub fn new() -> Self {
        let options = AblyOptions::from_key("test-app.test-key:test-secret")
            .expect("static test key is well-formed");
        Self {
            published: RwLock::new(Vec::new()),
            signer: AblyService::new(options),
            fail_publishes: false,
        }
    }

    /// Every publish returns an error (still recorded)
    pub fn failing() -> Self {
        Self {
            fail_publishes: true,
            ..Self::new()
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Get all published messages.
    pub fn published_messages(&self) -> Vec<PublishedMessage> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Get published messages for a specific channel.
    pub fn messages_for_channel(&self, channel: &str) -> Vec<PublishedMessage> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|m| m.channel == channel)
            .cloned()
            .collect()
    }

    /// Messages sent to one user's private channel.
    pub fn messages_for_user(&self, user_id: Uuid) -> Vec<PublishedMessage> {
        self.messages_for_channel(&channels::user(user_id))
    }

    pub fn was_published(&self, channel: &str, event: &str) -> bool {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|m| m.channel == channel && m.event == event)
    }

    pub fn publish_count(&self) -> usize {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn clear(&self) {
        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[async_trait]
impl BaseRealtimePublisher for TestRealtime {
    async fn publish(&self, channel: &str, event: &str, payload: serde_json::Value) -> Result<()> {
        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(PublishedMessage {
                channel: channel.to_string(),
                event: event.to_string(),
                payload,
            });

        if self.fail_publishes {
            anyhow::bail!("realtime publish failed (test)");
        }
        Ok(())
    }

    fn create_token_request(
        &self,
        client_id: &str,
        capability: Capability,
        ttl_ms: u64,
    ) -> Result<TokenRequest> {
        Ok(self.signer.create_token_request(TokenParams {
            client_id: Some(client_id.to_string()),
            capability: Some(capability),
            ttl_ms: Some(ttl_ms),
        })?)
    }
}

/// Publish and log failures instead of propagating them.
pub async fn publish_best_effort(
    publisher: &dyn BaseRealtimePublisher,
    channel: &str,
    event: &str,
    payload: serde_json::Value,
) {
    if let Err(e) = publisher.publish(channel, event, payload).await {
        tracing::warn!(error = %e, channel = %channel, event = %event, "Realtime publish failed");
    }
}
