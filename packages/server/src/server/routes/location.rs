use axum::{extract::Extension, Json};

use crate::common::ApiResult;
use crate::domains::profiles::actions::{update_location, UpdateLocationRequest};
use crate::domains::profiles::Profile;
use crate::server::app::AppState;
use crate::server::extract::ApiJson;
use crate::server::middleware::AuthUser;

/// POST /api/location
pub async fn update_location_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdateLocationRequest>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(update_location(user.user_id, request, &state.deps).await?))
}
