use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Safety check status stored on a profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SafetyStatus {
    Pending,
    Safe,
    NeedHelp,
}

impl SafetyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyStatus::Pending => "pending",
            SafetyStatus::Safe => "safe",
            SafetyStatus::NeedHelp => "need_help",
        }
    }
}

impl std::fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SafetyStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(SafetyStatus::Pending),
            "safe" => Ok(SafetyStatus::Safe),
            "need_help" => Ok(SafetyStatus::NeedHelp),
            _ => Err(anyhow::anyhow!("Invalid safety status: {}", s)),
        }
    }
}

/// Profile model - one row per Supabase auth user
#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,

    // Last-seen location
    pub last_latitude: Option<f64>,
    pub last_longitude: Option<f64>,
    pub last_seen_at: Option<DateTime<Utc>>,

    // Safety check window
    pub safety_status: Option<String>,
    pub safety_check_started_at: Option<DateTime<Utc>>,
    pub safety_check_expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn safety_status(&self) -> Option<SafetyStatus> {
        self.safety_status.as_deref().and_then(|s| s.parse().ok())
    }

    /// A window is open while the status is pending and the expiry is in the future
    pub fn has_open_safety_check(&self, now: DateTime<Utc>) -> bool {
        self.safety_status() == Some(SafetyStatus::Pending)
            && self.safety_check_expires_at.is_some_and(|exp| exp > now)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Case-insensitive email lookup
    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM profiles WHERE lower(email) = lower($1)")
            .bind(email.trim())
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert or refresh the profile for an auth user. Existing names and
    /// phones are kept when the new values are absent.
    pub async fn upsert(
        id: Uuid,
        email: &str,
        full_name: Option<&str>,
        phone: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO profiles (id, email, full_name, phone)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                full_name = COALESCE(EXCLUDED.full_name, profiles.full_name),
                phone = COALESCE(EXCLUDED.phone, profiles.phone)
             RETURNING *",
        )
        .bind(id)
        .bind(email)
        .bind(full_name)
        .bind(phone)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Record the last-seen location (timestamped now)
    pub async fn update_location(
        id: Uuid,
        latitude: f64,
        longitude: f64,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE profiles
             SET last_latitude = $2, last_longitude = $3, last_seen_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Open (or restart) a safety check window
    pub async fn open_safety_check(
        id: Uuid,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE profiles
             SET safety_status = 'pending',
                 safety_check_started_at = $2,
                 safety_check_expires_at = $3
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(started_at)
        .bind(expires_at)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Answer an open window.
    ///
    /// Returns None when no window is open (never started, already answered
    /// or expired). The check and the write are one statement.
    pub async fn answer_safety_check(
        id: Uuid,
        status: SafetyStatus,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE profiles
             SET safety_status = $2
             WHERE id = $1
               AND safety_status = 'pending'
               AND safety_check_expires_at > NOW()
             RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Clear every window whose expiry has passed (called by cron job)
    pub async fn clear_expired_safety_checks(pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE profiles
             SET safety_status = NULL,
                 safety_check_started_at = NULL,
                 safety_check_expires_at = NULL
             WHERE safety_check_expires_at IS NOT NULL
               AND safety_check_expires_at <= NOW()",
        )
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
