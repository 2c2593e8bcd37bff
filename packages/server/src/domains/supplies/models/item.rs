use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Catalog item (water, blankets, ...)
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM items ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_name(name: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM items WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_ids(ids: &[Uuid], pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM items WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert a new item, or return the existing one with the same name.
    /// The flag is true when a row was created.
    pub async fn find_or_create(
        name: &str,
        unit: Option<&str>,
        pool: &PgPool,
    ) -> Result<(Self, bool)> {
        let inserted = sqlx::query_as::<_, Self>(
            "INSERT INTO items (name, unit)
             VALUES ($1, $2)
             ON CONFLICT (name) DO NOTHING
             RETURNING *",
        )
        .bind(name)
        .bind(unit)
        .fetch_optional(pool)
        .await?;

        if let Some(item) = inserted {
            return Ok((item, true));
        }

        let existing = Self::find_by_name(name, pool)
            .await?
            .ok_or_else(|| anyhow::anyhow!("item {} vanished after conflict", name))?;
        Ok((existing, false))
    }
}
