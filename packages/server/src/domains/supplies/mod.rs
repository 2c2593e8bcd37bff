//! Supplies domain - relief pins, the item catalog, and per-region
//! aggregation of what is still needed.

pub mod actions;
pub mod models;

use crate::common::ApiResult;
use crate::kernel::ServerDeps;

pub use actions::{aggregate_supplies, RegionSupplies};
pub use models::{Item, Pin, PinStatus};

/// Outstanding supplies on confirmed pins, grouped by region
pub async fn supplies_by_region(deps: &ServerDeps) -> ApiResult<Vec<RegionSupplies>> {
    let rows = models::SupplyRow::find_outstanding(&deps.db_pool).await?;
    Ok(aggregate_supplies(&rows, deps.geocoder.as_ref()).await)
}
