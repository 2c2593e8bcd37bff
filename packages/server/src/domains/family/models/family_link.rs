use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// One direction of a family link. Links are always written in pairs.
#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct FamilyLink {
    pub user_id: Uuid,
    pub member_id: Uuid,
    pub relation: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A linked member as seen by the user who linked them
#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct FamilyMember {
    pub member_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub relation: Option<String>,
    pub last_latitude: Option<f64>,
    pub last_longitude: Option<f64>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub safety_status: Option<String>,
    pub safety_check_expires_at: Option<DateTime<Utc>>,
}

impl FamilyLink {
    /// Link two users in both directions. Re-linking updates the relation
    /// on the caller's side only.
    pub async fn link(
        user_id: Uuid,
        member_id: Uuid,
        relation: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let link = sqlx::query_as::<_, Self>(
            "INSERT INTO family_links (user_id, member_id, relation)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, member_id)
             DO UPDATE SET relation = COALESCE(EXCLUDED.relation, family_links.relation)
             RETURNING *",
        )
        .bind(user_id)
        .bind(member_id)
        .bind(relation)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO family_links (user_id, member_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id, member_id) DO NOTHING",
        )
        .bind(member_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(link)
    }

    /// Remove both directions. Returns rows removed (0 when not linked).
    pub async fn unlink(user_id: Uuid, member_id: Uuid, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM family_links
             WHERE (user_id = $1 AND member_id = $2)
                OR (user_id = $2 AND member_id = $1)",
        )
        .bind(user_id)
        .bind(member_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn is_linked(user_id: Uuid, member_id: Uuid, pool: &PgPool) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM family_links WHERE user_id = $1 AND member_id = $2)",
        )
        .bind(user_id)
        .bind(member_id)
        .fetch_one(pool)
        .await?;

        Ok(row.0)
    }

    /// Ids of everyone linked to a user
    pub async fn member_ids(user_id: Uuid, pool: &PgPool) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT member_id FROM family_links WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Linked members with their last-seen location and safety status
    pub async fn list_members(user_id: Uuid, pool: &PgPool) -> Result<Vec<FamilyMember>> {
        sqlx::query_as::<_, FamilyMember>(
            "SELECT p.id AS member_id,
                    p.email,
                    p.full_name,
                    f.relation,
                    p.last_latitude,
                    p.last_longitude,
                    p.last_seen_at,
                    p.safety_status,
                    p.safety_check_expires_at
             FROM family_links f
             JOIN profiles p ON p.id = f.member_id
             WHERE f.user_id = $1
             ORDER BY COALESCE(p.full_name, p.email)",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
