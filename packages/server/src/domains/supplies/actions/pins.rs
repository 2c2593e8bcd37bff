use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::common::{validate_coordinates, ApiError, ApiResult};
use crate::domains::supplies::models::{
    FulfillOutcome, Item, NewPin, NewPinItem, Pin, PinItemLine, PinStatus,
};
use crate::kernel::{channels, publish_best_effort, ServerDeps};

#[derive(Debug, Clone, Deserialize)]
pub struct PinItemRequest {
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePinRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub items: Vec<PinItemRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePinStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FulfillRequest {
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPinsQuery {
    pub status: Option<String>,
}

/// A pin with its lines
#[derive(Debug, Clone, Serialize)]
pub struct PinWithItems {
    #[serde(flatten)]
    pub pin: Pin,
    pub items: Vec<PinItemLine>,
}

fn parse_status(raw: &str) -> ApiResult<PinStatus> {
    raw.trim().parse::<PinStatus>().map_err(|_| {
        ApiError::bad_request("status must be pending, confirmed, fulfilled or rejected")
    })
}

impl CreatePinRequest {
    pub fn validate(self, created_by: Uuid) -> ApiResult<NewPin> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ApiError::bad_request("title must not be empty"));
        }
        validate_coordinates(self.latitude, self.longitude).map_err(ApiError::BadRequest)?;

        if self.items.is_empty() {
            return Err(ApiError::bad_request("at least one item is required"));
        }
        let mut seen = HashSet::new();
        for line in &self.items {
            if line.quantity <= 0 {
                return Err(ApiError::bad_request("quantities must be greater than 0"));
            }
            if !seen.insert(line.item_id) {
                return Err(ApiError::bad_request(format!(
                    "item {} is listed more than once",
                    line.item_id
                )));
            }
        }

        Ok(NewPin {
            created_by,
            title: title.to_string(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            latitude: self.latitude,
            longitude: self.longitude,
            items: self
                .items
                .iter()
                .map(|l| NewPinItem {
                    item_id: l.item_id,
                    quantity: l.quantity,
                })
                .collect(),
        })
    }
}

async fn with_items(pins: Vec<Pin>, deps: &ServerDeps) -> ApiResult<Vec<PinWithItems>> {
    let ids: Vec<Uuid> = pins.iter().map(|p| p.id).collect();
    let mut lines_by_pin: HashMap<Uuid, Vec<PinItemLine>> = HashMap::new();
    for line in PinItemLine::find_for_pins(&ids, &deps.db_pool).await? {
        lines_by_pin.entry(line.pin_id).or_default().push(line);
    }

    Ok(pins
        .into_iter()
        .map(|pin| {
            let items = lines_by_pin.remove(&pin.id).unwrap_or_default();
            PinWithItems { pin, items }
        })
        .collect())
}

async fn announce(pin: &PinWithItems, deps: &ServerDeps) {
    let payload = serde_json::to_value(pin).unwrap_or_else(|_| json!({ "id": pin.pin.id }));
    publish_best_effort(
        deps.realtime.as_ref(),
        channels::PINS,
        channels::EVENT_PIN_UPDATED,
        payload,
    )
    .await;
}

async fn load_with_items(id: Uuid, deps: &ServerDeps) -> ApiResult<PinWithItems> {
    let pin = Pin::find_by_id(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("pin {}", id)))?;

    with_items(vec![pin], deps)
        .await?
        .pop()
        .ok_or_else(|| ApiError::NotFound(format!("pin {}", id)))
}

pub async fn create_pin(
    request: CreatePinRequest,
    user_id: Uuid,
    deps: &ServerDeps,
) -> ApiResult<PinWithItems> {
    let new = request.validate(user_id)?;

    let ids: Vec<Uuid> = new.items.iter().map(|l| l.item_id).collect();
    let known: HashSet<Uuid> = Item::find_by_ids(&ids, &deps.db_pool)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();
    if let Some(unknown) = ids.iter().find(|id| !known.contains(id)) {
        return Err(ApiError::bad_request(format!("unknown item {}", unknown)));
    }

    let pin = Pin::create(&new, &deps.db_pool).await?;
    let pin = load_with_items(pin.id, deps).await?;

    info!(pin_id = %pin.pin.id, user_id = %user_id, lines = pin.items.len(), "Pin created");
    announce(&pin, deps).await;
    Ok(pin)
}

pub async fn list_pins(query: ListPinsQuery, deps: &ServerDeps) -> ApiResult<Vec<PinWithItems>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_status(raw)?),
    };

    let pins = Pin::find_all(status, &deps.db_pool).await?;
    with_items(pins, deps).await
}

pub async fn update_pin_status(
    id: Uuid,
    request: UpdatePinStatusRequest,
    is_admin: bool,
    deps: &ServerDeps,
) -> ApiResult<PinWithItems> {
    if !is_admin {
        return Err(ApiError::Forbidden("admin only".to_string()));
    }
    let next = parse_status(&request.status)?;

    let pin = Pin::find_by_id(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("pin {}", id)))?;
    let current = pin
        .status()
        .ok_or_else(|| anyhow::anyhow!("pin {} has unknown status {}", id, pin.status))?;

    if !current.can_transition_to(next) {
        return Err(ApiError::Conflict(format!(
            "cannot move pin from {} to {}",
            current, next
        )));
    }

    Pin::update_status(id, current, next, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::Conflict("pin status changed concurrently".to_string()))?;

    let pin = load_with_items(id, deps).await?;
    info!(pin_id = %id, from = %current, to = %next, "Pin status updated");
    announce(&pin, deps).await;
    Ok(pin)
}

pub async fn fulfill_pin_item(
    id: Uuid,
    request: FulfillRequest,
    user_id: Uuid,
    deps: &ServerDeps,
) -> ApiResult<PinWithItems> {
    if request.quantity <= 0 {
        return Err(ApiError::bad_request("quantity must be greater than 0"));
    }

    match Pin::fulfill(id, request.item_id, request.quantity, &deps.db_pool).await? {
        FulfillOutcome::PinNotFound => Err(ApiError::NotFound(format!("pin {}", id))),
        FulfillOutcome::NotConfirmed(status) => Err(ApiError::Conflict(format!(
            "only confirmed pins can be fulfilled (pin is {})",
            status
        ))),
        FulfillOutcome::ItemNotOnPin => Err(ApiError::NotFound(format!(
            "item {} on pin {}",
            request.item_id, id
        ))),
        FulfillOutcome::Applied {
            quantity_remaining,
            pin_fulfilled,
            ..
        } => {
            info!(
                pin_id = %id,
                item_id = %request.item_id,
                user_id = %user_id,
                quantity = request.quantity,
                quantity_remaining,
                pin_fulfilled,
                "Pin item fulfilled"
            );
            let pin = load_with_items(id, deps).await?;
            announce(&pin, deps).await;
            Ok(pin)
        }
    }
}
