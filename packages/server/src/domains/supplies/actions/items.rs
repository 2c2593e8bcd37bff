use serde::Deserialize;
use tracing::info;

use crate::common::{ApiError, ApiResult};
use crate::domains::supplies::models::Item;
use crate::kernel::ServerDeps;

pub const MAX_ITEM_NAME_CHARS: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
}

pub async fn list_items(deps: &ServerDeps) -> ApiResult<Vec<Item>> {
    Ok(Item::find_all(&deps.db_pool).await?)
}

/// Create a catalog item; an existing item with the same name is returned
/// unchanged.
pub async fn create_item(
    request: CreateItemRequest,
    is_admin: bool,
    deps: &ServerDeps,
) -> ApiResult<(Item, bool)> {
    if !is_admin {
        return Err(ApiError::Forbidden("admin only".to_string()));
    }

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    if name.chars().count() > MAX_ITEM_NAME_CHARS {
        return Err(ApiError::bad_request(format!(
            "name must be at most {} characters",
            MAX_ITEM_NAME_CHARS
        )));
    }
    let unit = request
        .unit
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let (item, created) = Item::find_or_create(name, unit, &deps.db_pool).await?;
    if created {
        info!(item_id = %item.id, name = %item.name, "Item created");
    }
    Ok((item, created))
}
