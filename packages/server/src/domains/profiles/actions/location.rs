use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::common::{validate_coordinates, ApiError, ApiResult};
use crate::domains::family::FamilyLink;
use crate::domains::profiles::Profile;
use crate::kernel::{channels, publish_best_effort, ServerDeps};

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
}

/// Store the caller's last-seen location and tell their family.
pub async fn update_location(
    user_id: Uuid,
    request: UpdateLocationRequest,
    deps: &ServerDeps,
) -> ApiResult<Profile> {
    validate_coordinates(request.latitude, request.longitude).map_err(ApiError::BadRequest)?;

    let profile =
        Profile::update_location(user_id, request.latitude, request.longitude, &deps.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("profile".to_string()))?;

    let payload = json!({
        "user_id": user_id,
        "latitude": profile.last_latitude,
        "longitude": profile.last_longitude,
        "last_seen_at": profile.last_seen_at,
    });

    for member_id in FamilyLink::member_ids(user_id, &deps.db_pool).await? {
        publish_best_effort(
            deps.realtime.as_ref(),
            &channels::user(member_id),
            channels::EVENT_LOCATION_UPDATED,
            payload.clone(),
        )
        .await;
    }

    debug!(user_id = %user_id, "Last-seen location updated");
    Ok(profile)
}
