use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::common::ApiResult;
use crate::domains::family::actions::{
    self, AddFamilyMemberRequest, RespondSafetyCheckRequest, StartSafetyCheckRequest,
};
use crate::domains::family::{FamilyLink, FamilyMember};
use crate::domains::profiles::Profile;
use crate::server::app::AppState;
use crate::server::extract::ApiJson;
use crate::server::middleware::AuthUser;

#[derive(Serialize)]
pub struct CleanupResponse {
    pub cleared: u64,
}

/// POST /api/family
pub async fn add_family_member_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<AddFamilyMemberRequest>,
) -> ApiResult<(StatusCode, Json<FamilyLink>)> {
    let link = actions::add_family_member(user.user_id, request, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// GET /api/family
pub async fn list_family_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<FamilyMember>>> {
    Ok(Json(actions::list_family(user.user_id, &state.deps).await?))
}

/// DELETE /api/family/:member_id
pub async fn remove_family_member_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(member_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    actions::remove_family_member(user.user_id, member_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/family/:member_id/safety-check
///
/// The body is optional; `{}` or no body uses the configured window.
pub async fn start_safety_check_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(member_id): Path<Uuid>,
    request: Option<ApiJson<StartSafetyCheckRequest>>,
) -> ApiResult<Json<Profile>> {
    let request = request.map(|ApiJson(r)| r).unwrap_or_default();
    Ok(Json(
        actions::start_safety_check(user.user_id, member_id, request, &state.deps).await?,
    ))
}

/// POST /api/safety-check/respond
pub async fn respond_safety_check_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<RespondSafetyCheckRequest>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(
        actions::respond_safety_check(user.user_id, request, &state.deps).await?,
    ))
}

/// POST /api/safety-check/cleanup
pub async fn cleanup_safety_checks_handler(
    Extension(state): Extension<AppState>,
) -> ApiResult<Json<CleanupResponse>> {
    let cleared = actions::cleanup_expired_safety_checks(&state.deps).await?;
    Ok(Json(CleanupResponse { cleared }))
}
