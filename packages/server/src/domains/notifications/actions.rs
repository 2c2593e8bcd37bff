//! Notification actions - create (with fan-out), list, mark read.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::model::{NewNotification, Notification};
use crate::common::{clamp_limit, ApiError, ApiResult};
use crate::domains::profiles::Profile;
use crate::kernel::{channels, publish_best_effort, ServerDeps};

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationRequest {
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl CreateNotificationRequest {
    pub fn validate(self) -> ApiResult<NewNotification> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ApiError::bad_request("title must not be empty"));
        }
        let kind = self.kind.trim();
        if kind.is_empty() {
            return Err(ApiError::bad_request("kind must not be empty"));
        }

        Ok(NewNotification {
            user_id: self.user_id,
            kind: kind.to_string(),
            title: title.to_string(),
            body: self.body.trim().to_string(),
            data: self.data.unwrap_or_else(|| serde_json::json!({})),
        })
    }
}

/// Persist a notification and push it to the recipient's channel.
pub async fn notify(new: &NewNotification, deps: &ServerDeps) -> anyhow::Result<Notification> {
    let notification = Notification::create(new, &deps.db_pool).await?;

    publish_best_effort(
        deps.realtime.as_ref(),
        &channels::user(notification.user_id),
        channels::EVENT_NOTIFICATION,
        serde_json::to_value(&notification)?,
    )
    .await;

    Ok(notification)
}

pub async fn create_notification(
    request: CreateNotificationRequest,
    sender: Uuid,
    deps: &ServerDeps,
) -> ApiResult<Notification> {
    let new = request.validate()?;

    if Profile::find_by_id(new.user_id, &deps.db_pool).await?.is_none() {
        return Err(ApiError::NotFound(format!("user {}", new.user_id)));
    }

    let notification = notify(&new, deps).await?;
    info!(
        notification_id = %notification.id,
        recipient = %notification.user_id,
        sender = %sender,
        kind = %notification.kind,
        "Notification created"
    );
    Ok(notification)
}

pub async fn list_notifications(
    user_id: Uuid,
    unread_only: bool,
    limit: Option<i64>,
    deps: &ServerDeps,
) -> ApiResult<Vec<Notification>> {
    let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    Ok(Notification::list_for_user(user_id, unread_only, limit, &deps.db_pool).await?)
}

pub async fn mark_read(id: Uuid, user_id: Uuid, deps: &ServerDeps) -> ApiResult<Notification> {
    Notification::mark_read(id, user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("notification {}", id)))
}
