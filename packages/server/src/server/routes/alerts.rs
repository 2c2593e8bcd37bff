use axum::{extract::Extension, http::StatusCode, Json};

use crate::common::ApiResult;
use crate::domains::alerts::actions::{self, BroadcastAlertRequest, ListAlertsQuery};
use crate::domains::alerts::Alert;
use crate::server::app::AppState;
use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::middleware::AuthUser;

/// POST /api/alerts/broadcast (admin)
pub async fn broadcast_alert_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<BroadcastAlertRequest>,
) -> ApiResult<(StatusCode, Json<Alert>)> {
    let alert =
        actions::broadcast_alert(request, user.is_admin, user.user_id, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

/// GET /api/alerts
pub async fn list_alerts_handler(
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<ListAlertsQuery>,
) -> ApiResult<Json<Vec<Alert>>> {
    Ok(Json(actions::list_alerts(query, &state.deps).await?))
}
