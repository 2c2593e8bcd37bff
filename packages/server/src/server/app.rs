//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::{extract_client_ip, jwt_auth_middleware};
use crate::server::routes::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: ServerDeps,
}

impl AppState {
    pub fn new(deps: ServerDeps) -> Self {
        Self {
            db_pool: deps.db_pool.clone(),
            deps,
        }
    }
}

/// Every `/api` route
fn api_routes() -> Router {
    Router::new()
        // Auth
        .route("/api/auth/signup", post(signup_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/me", get(me_handler))
        // Profiles
        .route("/api/location", post(update_location_handler))
        // Family & safety checks
        .route(
            "/api/family",
            post(add_family_member_handler).get(list_family_handler),
        )
        .route("/api/family/:member_id", delete(remove_family_member_handler))
        .route(
            "/api/family/:member_id/safety-check",
            post(start_safety_check_handler),
        )
        .route("/api/safety-check/respond", post(respond_safety_check_handler))
        .route("/api/safety-check/cleanup", post(cleanup_safety_checks_handler))
        // Notifications
        .route(
            "/api/notifications",
            post(create_notification_handler).get(list_notifications_handler),
        )
        .route(
            "/api/notifications/:id/read",
            post(mark_notification_read_handler),
        )
        // Alerts
        .route("/api/alerts", get(list_alerts_handler))
        .route("/api/alerts/broadcast", post(broadcast_alert_handler))
        // Realtime
        .route("/api/realtime/token", get(realtime_token_handler))
        // Chat assistant
        .route("/api/chat", post(chat_handler))
        // Directory
        .route("/api/contacts", get(search_contacts_handler))
        .route("/api/sessions", get(search_sessions_handler))
        // Supplies
        .route("/api/items", get(list_items_handler).post(create_item_handler))
        .route("/api/pins", get(list_pins_handler).post(create_pin_handler))
        .route("/api/pins/:id/status", post(update_pin_status_handler))
        .route("/api/pins/:id/fulfill", post(fulfill_pin_handler))
        .route("/api/supplies/aggregate", get(aggregate_supplies_handler))
}

/// Attach health, auth and state to a set of API routes
fn assemble(deps: ServerDeps, api: Router) -> Router {
    let jwt = deps.jwt.clone();
    let app_state = AppState::new(deps);

    api
        // Health check (no rate limit)
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt.clone(), req, next)
        })) // JWT authentication
        .layer(Extension(app_state))
}

/// Router without connection-level layers (rate limiting, client IP,
/// CORS). Used by tests driving the service directly.
pub fn build_router(deps: ServerDeps) -> Router {
    assemble(deps, api_routes())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Build the Axum application router
///
/// Must be served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn build_app(deps: ServerDeps, allowed_origins: &[String]) -> Result<Router> {
    // Rate limiting configuration
    // 10 requests per second per IP with bursts up to 20
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .use_headers() // Key on X-Forwarded-For / X-Real-IP, then peer address
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?,
    );

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    let app = assemble(deps, api_routes().layer(rate_limit_layer))
        .layer(middleware::from_fn(extract_client_ip))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}
