use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input,
};
use crate::services::carts::CartView;
use crate::AppState;

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct AddItemRequest {
    /// Menu item to add one unit of.
    #[validate(range(min = 1, message = "menu_item_id must be positive"))]
    pub menu_item_id: i32,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateQuantityRequest {
    /// New exact quantity; anything below 1 removes the line.
    pub quantity: i64,
}

/// Create a new empty cart.
#[utoipa::path(
    post,
    path = "/api/v1/carts",
    responses(
        (status = 201, description = "Cart created", body = CartView)
    ),
    tag = "carts"
)]
pub async fn create_cart(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let cart = state.services.carts.create_cart();
    Ok(created_response(cart))
}

/// Fetch a cart with derived totals.
#[utoipa::path(
    get,
    path = "/api/v1/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Cart", body = CartView),
        (status = 404, description = "Cart not found")
    ),
    tag = "carts"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state.services.carts.get_cart(id).map_err(map_service_error)?;
    Ok(success_response(cart))
}

/// Add one unit of a menu item to the cart.
#[utoipa::path(
    post,
    path = "/api/v1/carts/{id}/items",
    params(("id" = Uuid, Path, description = "Cart id")),
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 404, description = "Cart or menu item not found")
    ),
    tag = "carts"
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let cart = state
        .services
        .carts
        .add_item(id, payload.menu_item_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

/// Set a line's quantity exactly; below 1 removes the line.
#[utoipa::path(
    put,
    path = "/api/v1/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = i32, Path, description = "Menu item id")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 404, description = "Cart not found")
    ),
    tag = "carts"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, i32)>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .carts
        .update_quantity(id, item_id, payload.quantity)
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

/// Remove a line from the cart.
#[utoipa::path(
    delete,
    path = "/api/v1/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = i32, Path, description = "Menu item id")
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 404, description = "Cart not found")
    ),
    tag = "carts"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .carts
        .remove_item(id, item_id)
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

/// Empty the cart.
#[utoipa::path(
    post,
    path = "/api/v1/carts/{id}/clear",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Emptied cart", body = CartView),
        (status = 404, description = "Cart not found")
    ),
    tag = "carts"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .carts
        .clear_cart(id)
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cart))
        .route("/:id", get(get_cart))
        .route("/:id/items", post(add_item))
        .route(
            "/:id/items/:item_id",
            put(update_quantity).delete(remove_item),
        )
        .route("/:id/clear", post(clear_cart))
}
