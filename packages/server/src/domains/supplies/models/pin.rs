use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Pin lifecycle: pending → confirmed → fulfilled, or pending → rejected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PinStatus {
    Pending,
    Confirmed,
    Fulfilled,
    Rejected,
}

impl PinStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinStatus::Pending => "pending",
            PinStatus::Confirmed => "confirmed",
            PinStatus::Fulfilled => "fulfilled",
            PinStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, next: PinStatus) -> bool {
        matches!(
            (self, next),
            (PinStatus::Pending, PinStatus::Confirmed)
                | (PinStatus::Pending, PinStatus::Rejected)
                | (PinStatus::Confirmed, PinStatus::Fulfilled)
        )
    }
}

impl std::fmt::Display for PinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PinStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(PinStatus::Pending),
            "confirmed" => Ok(PinStatus::Confirmed),
            "fulfilled" => Ok(PinStatus::Fulfilled),
            "rejected" => Ok(PinStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid pin status: {}", s)),
        }
    }
}

/// Pin model - a geolocated request for relief supplies
#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct Pin {
    pub id: Uuid,
    pub created_by: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A requested line on a new pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewPinItem {
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewPin {
    pub created_by: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub items: Vec<NewPinItem>,
}

/// Result of decrementing a pin line
#[derive(Debug, Clone)]
pub enum FulfillOutcome {
    PinNotFound,
    NotConfirmed(String),
    ItemNotOnPin,
    Applied {
        pin: Pin,
        quantity_remaining: i32,
        pin_fulfilled: bool,
    },
}

impl Pin {
    pub fn status(&self) -> Option<PinStatus> {
        self.status.parse().ok()
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM pins WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Newest first, optionally filtered by status
    pub async fn find_all(status: Option<PinStatus>, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM pins
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert the pin and all its lines in one transaction
    pub async fn create(new: &NewPin, pool: &PgPool) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let pin = sqlx::query_as::<_, Self>(
            "INSERT INTO pins (created_by, title, description, latitude, longitude)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(new.created_by)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.latitude)
        .bind(new.longitude)
        .fetch_one(&mut *tx)
        .await?;

        for line in &new.items {
            sqlx::query(
                "INSERT INTO pin_items (pin_id, item_id, quantity_requested, quantity_remaining)
                 VALUES ($1, $2, $3, $3)",
            )
            .bind(pin.id)
            .bind(line.item_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(pin)
    }

    /// Move `from` → `to`. None when the pin is no longer in `from`.
    pub async fn update_status(
        id: Uuid,
        from: PinStatus,
        to: PinStatus,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE pins
             SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING *",
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Decrement one line (floored at 0) on a confirmed pin. When every line
    /// reaches 0 the pin becomes fulfilled in the same transaction.
    pub async fn fulfill(
        id: Uuid,
        item_id: Uuid,
        quantity: i32,
        pool: &PgPool,
    ) -> Result<FulfillOutcome> {
        let mut tx = pool.begin().await?;

        let pin = sqlx::query_as::<_, Self>("SELECT * FROM pins WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(pin) = pin else {
            return Ok(FulfillOutcome::PinNotFound);
        };
        if pin.status() != Some(PinStatus::Confirmed) {
            return Ok(FulfillOutcome::NotConfirmed(pin.status));
        }

        let remaining: Option<(i32,)> = sqlx::query_as(
            "UPDATE pin_items
             SET quantity_remaining = GREATEST(quantity_remaining - $3, 0)
             WHERE pin_id = $1 AND item_id = $2
             RETURNING quantity_remaining",
        )
        .bind(id)
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((quantity_remaining,)) = remaining else {
            return Ok(FulfillOutcome::ItemNotOnPin);
        };

        let (outstanding,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM pin_items WHERE pin_id = $1 AND quantity_remaining > 0",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let pin_fulfilled = outstanding == 0;
        let pin = if pin_fulfilled {
            sqlx::query_as::<_, Self>(
                "UPDATE pins SET status = 'fulfilled', updated_at = NOW()
                 WHERE id = $1
                 RETURNING *",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_as::<_, Self>(
                "UPDATE pins SET updated_at = NOW() WHERE id = $1 RETURNING *",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
        };

        tx.commit().await?;
        Ok(FulfillOutcome::Applied {
            pin,
            quantity_remaining,
            pin_fulfilled,
        })
    }
}
