use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::entities::menu_item;
use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::AppState;

/// List the full menu, id ascending.
#[utoipa::path(
    get,
    path = "/api/v1/menu",
    responses(
        (status = 200, description = "Menu items", body = [menu_item::Model])
    ),
    tag = "menu"
)]
pub async fn list_menu(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .menu
        .list_menu()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

/// Fetch a single menu item.
#[utoipa::path(
    get,
    path = "/api/v1/menu/{id}",
    params(("id" = i32, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item", body = menu_item::Model),
        (status = 404, description = "Menu item not found")
    ),
    tag = "menu"
)]
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .menu
        .get_item(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

/// Distinct menu categories, alphabetical.
#[utoipa::path(
    get,
    path = "/api/v1/menu/categories",
    responses(
        (status = 200, description = "Category names", body = [String])
    ),
    tag = "menu"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .services
        .menu
        .list_categories()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(categories))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_menu))
        .route("/categories", get(list_categories))
        .route("/:id", get(get_menu_item))
}
