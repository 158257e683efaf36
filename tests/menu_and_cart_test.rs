//! Menu browsing and cart manipulation over HTTP.

mod common;

use axum::http::Method;
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn menu_lists_items_and_categories() {
    let app = TestApp::new().await;
    app.seed_menu_item("Paneer Tikka", dec!(250), "Starters").await;
    app.seed_menu_item("Butter Naan", dec!(30), "Breads").await;
    app.seed_menu_item("Garlic Naan", dec!(40), "Breads").await;

    let menu = response_json(
        app.request_anonymous(Method::GET, "/api/v1/menu", None)
            .await,
    )
    .await;
    let items = menu.as_array().expect("menu array");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["name"], "Paneer Tikka");
    assert_eq!(items[0]["price"], "250");

    let categories = response_json(
        app.request_anonymous(Method::GET, "/api/v1/menu/categories", None)
            .await,
    )
    .await;
    assert_eq!(categories, json!(["Breads", "Starters"]));
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn unknown_menu_item_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request_anonymous(Method::GET, "/api/v1/menu/9999", None)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn cart_add_update_remove_and_clear() {
    let app = TestApp::new().await;
    let paneer = app.seed_menu_item("Paneer Tikka", dec!(250), "Starters").await;
    let naan = app.seed_menu_item("Butter Naan", dec!(30), "Breads").await;

    let cart = response_json(
        app.request_anonymous(Method::POST, "/api/v1/carts", None)
            .await,
    )
    .await;
    let cart_id = cart["id"].as_str().expect("cart id").to_string();
    assert_eq!(cart["totals"]["total_items"], 0);

    // Repeated adds collapse into one line per item.
    for item_id in [paneer.id, paneer.id, naan.id] {
        app.request_anonymous(
            Method::POST,
            &format!("/api/v1/carts/{cart_id}/items"),
            Some(json!({ "menu_item_id": item_id })),
        )
        .await;
    }
    let cart = response_json(
        app.request_anonymous(Method::GET, &format!("/api/v1/carts/{cart_id}"), None)
            .await,
    )
    .await;
    assert_eq!(cart["lines"].as_array().map(|l| l.len()), Some(2));
    assert_eq!(cart["totals"]["total_price"], "530");

    // Exact quantity update.
    let updated = response_json(
        app.request_anonymous(
            Method::PUT,
            &format!("/api/v1/carts/{cart_id}/items/{}", paneer.id),
            Some(json!({ "quantity": 1 })),
        )
        .await,
    )
    .await;
    assert_eq!(updated["totals"]["total_price"], "280");

    // Quantity 0 removes the line.
    let updated = response_json(
        app.request_anonymous(
            Method::PUT,
            &format!("/api/v1/carts/{cart_id}/items/{}", paneer.id),
            Some(json!({ "quantity": 0 })),
        )
        .await,
    )
    .await;
    assert_eq!(updated["lines"].as_array().map(|l| l.len()), Some(1));

    // Explicit removal of the remaining line.
    let removed = response_json(
        app.request_anonymous(
            Method::DELETE,
            &format!("/api/v1/carts/{cart_id}/items/{}", naan.id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(removed["totals"]["total_items"], 0);

    // Clear is idempotent on an already-empty cart.
    let cleared = app
        .request_anonymous(Method::POST, &format!("/api/v1/carts/{cart_id}/clear"), None)
        .await;
    assert_eq!(cleared.status(), 200);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn adding_unknown_menu_item_is_not_found() {
    let app = TestApp::new().await;

    let cart = response_json(
        app.request_anonymous(Method::POST, "/api/v1/carts", None)
            .await,
    )
    .await;
    let cart_id = cart["id"].as_str().expect("cart id").to_string();

    let response = app
        .request_anonymous(
            Method::POST,
            &format!("/api/v1/carts/{cart_id}/items"),
            Some(json!({ "menu_item_id": 424242 })),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn unknown_cart_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request_anonymous(
            Method::GET,
            &format!("/api/v1/carts/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn health_and_status_report_ok() {
    let app = TestApp::new().await;

    let health = app.request_anonymous(Method::GET, "/health", None).await;
    assert_eq!(health.status(), 200);
    let body = response_json(health).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["checks"]["database"], "healthy");

    let status = app.request_anonymous(Method::GET, "/status", None).await;
    assert_eq!(status.status(), 200);
    let body = response_json(status).await;
    assert_eq!(body["data"]["service"], "dinetab-api");
}
