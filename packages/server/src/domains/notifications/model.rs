use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Notification kinds written by the server itself
pub mod kinds {
    pub const SAFETY_CHECK: &str = "safety_check";
    pub const SAFETY_STATUS: &str = "safety_status";
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

impl Notification {
    pub async fn create(new: &NewNotification, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO notifications (user_id, kind, title, body, data)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(new.user_id)
        .bind(&new.kind)
        .bind(&new.title)
        .bind(&new.body)
        .bind(&new.data)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Newest first
    pub async fn list_for_user(
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM notifications
             WHERE user_id = $1
               AND ($2 = false OR read_at IS NULL)
             ORDER BY created_at DESC
             LIMIT $3",
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Mark read if owned by `user_id`. Already-read rows keep their
    /// original timestamp. None when missing or owned by someone else.
    pub async fn mark_read(id: Uuid, user_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE notifications
             SET read_at = COALESCE(read_at, NOW())
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}
