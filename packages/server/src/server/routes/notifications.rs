use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::ApiResult;
use crate::domains::notifications::actions::{self, CreateNotificationRequest};
use crate::domains::notifications::Notification;
use crate::server::app::AppState;
use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::middleware::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

/// POST /api/notifications
pub async fn create_notification_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateNotificationRequest>,
) -> ApiResult<(StatusCode, Json<Notification>)> {
    let notification = actions::create_notification(request, user.user_id, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// GET /api/notifications
pub async fn list_notifications_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ListNotificationsQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(
        actions::list_notifications(user.user_id, query.unread_only, query.limit, &state.deps)
            .await?,
    ))
}

/// POST /api/notifications/:id/read
pub async fn mark_notification_read_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(actions::mark_read(id, user.user_id, &state.deps).await?))
}
