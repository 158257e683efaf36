use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::services::checkout::{CheckoutState, Receipt};
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TableNumberRequest {
    /// Table the order should be delivered to. Trimmed before storage;
    /// blank input is rejected with a field-level error.
    pub table_number: String,
}

/// Current submission flow state for a cart.
#[utoipa::path(
    get,
    path = "/api/v1/checkout/{cart_id}",
    params(("cart_id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Flow state", body = CheckoutState),
        (status = 404, description = "Cart not found")
    ),
    tag = "checkout"
)]
pub async fn get_state(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let flow = state
        .services
        .checkout
        .state(cart_id)
        .map_err(map_service_error)?;
    Ok(success_response(flow))
}

/// Start the submission flow. Refused while the cart is empty.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/{cart_id}/begin",
    params(("cart_id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Awaiting table number", body = CheckoutState),
        (status = 400, description = "Cart is empty"),
        (status = 404, description = "Cart not found")
    ),
    tag = "checkout"
)]
pub async fn begin(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let flow = state
        .services
        .checkout
        .begin(cart_id)
        .map_err(map_service_error)?;
    Ok(success_response(flow))
}

/// Capture the table number and move to confirmation.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/{cart_id}/table",
    params(("cart_id" = Uuid, Path, description = "Cart id")),
    request_body = TableNumberRequest,
    responses(
        (status = 200, description = "Awaiting confirmation", body = CheckoutState),
        (status = 400, description = "Blank table number or flow not started"),
        (status = 404, description = "Cart not found")
    ),
    tag = "checkout"
)]
pub async fn set_table_number(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    Json(payload): Json<TableNumberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let flow = state
        .services
        .checkout
        .set_table_number(cart_id, &payload.table_number)
        .map_err(map_service_error)?;
    Ok(success_response(flow))
}

/// Place the order. On success the cart is emptied and a receipt is
/// returned; on a store failure the flow stays at confirmation and the cart
/// is untouched.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/{cart_id}/confirm",
    params(("cart_id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Order placed", body = Receipt),
        (status = 400, description = "Flow not at confirmation"),
        (status = 409, description = "Submission already in progress"),
        (status = 404, description = "Cart not found")
    ),
    tag = "checkout"
)]
pub async fn confirm(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    session: Session,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .services
        .checkout
        .confirm(cart_id, session.user_id.as_deref())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(receipt))
}

/// Abandon the flow: back to idle, cart untouched.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/{cart_id}/cancel",
    params(("cart_id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Flow reset", body = CheckoutState),
        (status = 404, description = "Cart not found")
    ),
    tag = "checkout"
)]
pub async fn cancel(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let flow = state
        .services
        .checkout
        .cancel(cart_id)
        .map_err(map_service_error)?;
    Ok(success_response(flow))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:cart_id", get(get_state))
        .route("/:cart_id/begin", post(begin))
        .route("/:cart_id/table", post(set_table_number))
        .route("/:cart_id/confirm", post(confirm))
        .route("/:cart_id/cancel", post(cancel))
}
