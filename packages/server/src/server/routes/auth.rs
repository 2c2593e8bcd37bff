use axum::{extract::Extension, http::StatusCode, Json};

use crate::common::ApiResult;
use crate::domains::auth::actions::{self, LoginRequest, SignUpRequest, SignUpResponse};
use crate::domains::profiles::Profile;
use crate::kernel::AuthSession;
use crate::server::app::AppState;
use crate::server::extract::ApiJson;
use crate::server::middleware::AuthUser;

/// POST /api/auth/signup
pub async fn signup_handler(
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<SignUpResponse>)> {
    let response = actions::sign_up(request, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login_handler(
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthSession>> {
    Ok(Json(actions::log_in(request, &state.deps).await?))
}

/// POST /api/auth/logout
pub async fn logout_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<StatusCode> {
    actions::log_out(user.user_id, &user.access_token, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
pub async fn me_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Profile>> {
    Ok(Json(actions::current_profile(user.user_id, &state.deps).await?))
}
