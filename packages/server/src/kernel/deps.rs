//! Server dependencies for handlers (using traits for testability)
//!
//! This module provides the central dependency container used by every
//! domain. All external services use trait abstractions to enable testing.

use sqlx::PgPool;
use std::sync::Arc;

use crate::domains::auth::JwtVerifier;
use crate::domains::directory::Directory;
use crate::kernel::{BaseAuthProvider, BaseChatModel, BaseGeocoder, BaseRealtimePublisher};

/// Server dependencies accessible to handlers (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    /// Ably fan-out and token signing
    pub realtime: Arc<dyn BaseRealtimePublisher>,
    /// Supabase GoTrue
    pub auth_provider: Arc<dyn BaseAuthProvider>,
    pub jwt: Arc<JwtVerifier>,
    /// `None` when no LLM provider is configured
    pub chat_model: Option<Arc<dyn BaseChatModel>>,
    pub geocoder: Arc<dyn BaseGeocoder>,
    /// Static emergency directory (contacts + sessions)
    pub directory: Arc<Directory>,
    pub safety_check_minutes: i64,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db_pool: PgPool,
        realtime: Arc<dyn BaseRealtimePublisher>,
        auth_provider: Arc<dyn BaseAuthProvider>,
        jwt: Arc<JwtVerifier>,
        chat_model: Option<Arc<dyn BaseChatModel>>,
        geocoder: Arc<dyn BaseGeocoder>,
        directory: Arc<Directory>,
        safety_check_minutes: i64,
    ) -> Self {
        Self {
            db_pool,
            realtime,
            auth_provider,
            jwt,
            chat_model,
            geocoder,
            directory,
            safety_check_minutes,
        }
    }
}
