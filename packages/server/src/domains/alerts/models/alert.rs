use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::calculate_distance_km;

/// Alert kind enum for type-safe querying
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Earthquake,
    Flood,
    Other,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Earthquake => "earthquake",
            AlertKind::Flood => "flood",
            AlertKind::Other => "other",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "earthquake" => Ok(AlertKind::Earthquake),
            "flood" => Ok(AlertKind::Flood),
            "other" => Ok(AlertKind::Other),
            _ => Err(anyhow::anyhow!("Invalid alert kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// ≥ 6.0 critical, ≥ 4.5 warning, otherwise info
    pub fn from_magnitude(magnitude: Option<f64>) -> Self {
        match magnitude {
            Some(m) if m >= 6.0 => Severity::Critical,
            Some(m) if m >= 4.5 => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(anyhow::anyhow!("Invalid severity: {}", s)),
        }
    }
}

/// Alert model - manual broadcasts and polled earthquakes
#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct Alert {
    pub id: Uuid,
    pub kind: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub magnitude: Option<f64>,
    pub source: String,
    pub external_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new alert
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub magnitude: Option<f64>,
    pub source: String,
    pub external_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Center and radius for "alerts near me"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearFilter {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

const KM_PER_DEGREE_LAT: f64 = 111.0;

impl Alert {
    pub fn distance_km_from(&self, latitude: f64, longitude: f64) -> Option<f64> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(calculate_distance_km(latitude, longitude, lat, lng)),
            _ => None,
        }
    }

    /// Insert an alert.
    ///
    /// Returns None when `external_id` is already stored, so a feed item is
    /// persisted (and broadcast) at most once.
    pub async fn insert(new: &NewAlert, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO alerts (
                kind, severity, title, message,
                latitude, longitude, magnitude,
                source, external_id, occurred_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (external_id) DO NOTHING
             RETURNING *",
        )
        .bind(new.kind.as_str())
        .bind(new.severity.as_str())
        .bind(&new.title)
        .bind(&new.message)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(new.magnitude)
        .bind(&new.source)
        .bind(&new.external_id)
        .bind(new.occurred_at)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Most recent first
    pub async fn find_recent(
        limit: i64,
        kind: Option<AlertKind>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM alerts
             WHERE ($1::text IS NULL OR kind = $1)
             ORDER BY occurred_at DESC
             LIMIT $2",
        )
        .bind(kind.map(|k| k.as_str()))
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Most recent alerts within `near.radius_km` of a point.
    ///
    /// A latitude band narrows the scan in SQL; exact great-circle distance
    /// is checked here. Alerts without coordinates never match.
    pub async fn find_recent_near(
        limit: i64,
        kind: Option<AlertKind>,
        near: NearFilter,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let band = near.radius_km / KM_PER_DEGREE_LAT;
        let limit = usize::try_from(limit).unwrap_or(0);

        let mut rows = sqlx::query_as::<_, Self>(
            "SELECT * FROM alerts
             WHERE ($1::text IS NULL OR kind = $1)
               AND latitude IS NOT NULL
               AND longitude IS NOT NULL
               AND latitude BETWEEN $2 AND $3
             ORDER BY occurred_at DESC",
        )
        .bind(kind.map(|k| k.as_str()))
        .bind(near.latitude - band)
        .bind(near.latitude + band)
        .fetch(pool);

        let mut found = Vec::new();
        while found.len() < limit {
            let Some(alert) = rows.try_next().await? else {
                break;
            };
            let within = alert
                .distance_km_from(near.latitude, near.longitude)
                .is_some_and(|d| d <= near.radius_km);
            if within {
                found.push(alert);
            }
        }

        Ok(found)
    }
}
