use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::common::ApiResult;
use crate::domains::supplies::actions::{
    self, CreateItemRequest, CreatePinRequest, FulfillRequest, ListPinsQuery, PinWithItems,
    UpdatePinStatusRequest,
};
use crate::domains::supplies::{supplies_by_region, Item, RegionSupplies};
use crate::server::app::AppState;
use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::middleware::AuthUser;

/// GET /api/items
pub async fn list_items_handler(
    Extension(state): Extension<AppState>,
) -> ApiResult<Json<Vec<Item>>> {
    Ok(Json(actions::list_items(&state.deps).await?))
}

/// POST /api/items (admin). 201 when created, 200 when the name existed.
pub async fn create_item_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let (item, created) = actions::create_item(request, user.is_admin, &state.deps).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(item)))
}

/// POST /api/pins
pub async fn create_pin_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreatePinRequest>,
) -> ApiResult<(StatusCode, Json<PinWithItems>)> {
    let pin = actions::create_pin(request, user.user_id, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(pin)))
}

/// GET /api/pins?status=
pub async fn list_pins_handler(
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<ListPinsQuery>,
) -> ApiResult<Json<Vec<PinWithItems>>> {
    Ok(Json(actions::list_pins(query, &state.deps).await?))
}

/// POST /api/pins/:id/status (admin)
pub async fn update_pin_status_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdatePinStatusRequest>,
) -> ApiResult<Json<PinWithItems>> {
    Ok(Json(
        actions::update_pin_status(id, request, user.is_admin, &state.deps).await?,
    ))
}

/// POST /api/pins/:id/fulfill
pub async fn fulfill_pin_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<FulfillRequest>,
) -> ApiResult<Json<PinWithItems>> {
    Ok(Json(
        actions::fulfill_pin_item(id, request, user.user_id, &state.deps).await?,
    ))
}

/// GET /api/supplies/aggregate
pub async fn aggregate_supplies_handler(
    Extension(state): Extension<AppState>,
) -> ApiResult<Json<Vec<RegionSupplies>>> {
    Ok(Json(supplies_by_region(&state.deps).await?))
}
