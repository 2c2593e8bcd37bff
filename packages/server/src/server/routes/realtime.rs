use axum::{extract::Extension, Json};

use crate::common::ApiResult;
use crate::kernel::realtime::client_capability;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// Token lifetime handed to browsers
pub const TOKEN_TTL_MS: u64 = 60 * 60 * 1000;

/// GET /api/realtime/token
///
/// A signed Ably token request; the browser exchanges it with Ably directly.
pub async fn realtime_token_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ably::TokenRequest>> {
    let request = state.deps.realtime.create_token_request(
        &user.user_id.to_string(),
        client_capability(user.user_id),
        TOKEN_TTL_MS,
    )?;
    Ok(Json(request))
}
