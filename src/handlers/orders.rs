use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{ApiError, ServiceError};
use crate::handlers::common::{map_service_error, no_content_response, success_response};
use crate::services::orders::OrderView;
use crate::session::Session;
use crate::AppState;

/// Order history for one user. `message` explains an empty anonymous list.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub orders: Vec<OrderView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Order history for the session user, newest first. An anonymous session
/// gets an empty list with an explanatory message instead of a query.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "Order history", body = HistoryResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ApiError> {
    let Some(user_id) = session.user_id else {
        return Ok(success_response(HistoryResponse {
            orders: Vec::new(),
            message: Some("No order history yet; place an order to get started.".to_string()),
        }));
    };

    let orders = state
        .services
        .orders
        .list_for_user(&user_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(HistoryResponse {
        orders,
        message: None,
    }))
}

/// Fetch a single order.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderView),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Delete an unpaid order belonging to the session user.
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 403, description = "Not the order's owner"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already paid")
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    session: Session,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user_id.ok_or_else(|| {
        map_service_error(ServiceError::Forbidden(
            "A user id is required to delete an order".to_string(),
        ))
    })?;

    state
        .services
        .orders
        .delete_order(id, &user_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Record counter payment for an order.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order marked paid", body = OrderView),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already paid")
    ),
    tag = "orders"
)]
pub async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .mark_paid(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Mark a paid order as prepared and handed over.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/complete",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order completed", body = OrderView),
        (status = 400, description = "Order not paid yet"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already completed")
    ),
    tag = "orders"
)]
pub async fn mark_completed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .mark_completed(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order).delete(delete_order))
        .route("/:id/pay", post(mark_paid))
        .route("/:id/complete", post(mark_completed))
}
