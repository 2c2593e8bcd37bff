use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// A pin line joined with its catalog item
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct PinItemLine {
    #[serde(skip)]
    pub pin_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub unit: Option<String>,
    pub quantity_requested: i32,
    pub quantity_remaining: i32,
}

/// One row of the supply join: a confirmed pin's line with its location
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct SupplyRow {
    pub pin_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub item_name: String,
    pub unit: Option<String>,
    pub quantity_remaining: i32,
}

impl PinItemLine {
    pub async fn find_for_pins(pin_ids: &[Uuid], pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT pi.pin_id,
                    pi.item_id,
                    i.name AS item_name,
                    i.unit,
                    pi.quantity_requested,
                    pi.quantity_remaining
             FROM pin_items pi
             JOIN items i ON i.id = pi.item_id
             WHERE pi.pin_id = ANY($1)
             ORDER BY i.name",
        )
        .bind(pin_ids)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

impl SupplyRow {
    /// pins → pin_items → items for confirmed pins with something outstanding
    pub async fn find_outstanding(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT p.id AS pin_id,
                    p.latitude,
                    p.longitude,
                    i.name AS item_name,
                    i.unit,
                    pi.quantity_remaining
             FROM pins p
             JOIN pin_items pi ON pi.pin_id = p.id
             JOIN items i ON i.id = pi.item_id
             WHERE p.status = 'confirmed'
               AND pi.quantity_remaining > 0
             ORDER BY p.created_at",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
