use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DineTab API",
        version = "0.1.0",
        description = r#"
# DineTab Table-Side Ordering API

Backend for a restaurant table-side ordering app: guests browse the menu,
build a cart, submit an order against a table number, pay at the counter,
and review their order history. Staff endpoints mark orders paid and
completed; daily sales rollups feed the analytics views.

## Sessions

Requests that act on behalf of a guest identify them with the `x-user-id`
header. Anonymous requests can browse and build carts but cannot place or
delete orders.

## Error Handling

Errors use a consistent JSON shape with appropriate HTTP status codes:

```json
{
  "error": "Not Found",
  "message": "Menu item with ID 42 not found",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "menu", description = "Menu browsing endpoints"),
        (name = "carts", description = "Cart management endpoints"),
        (name = "checkout", description = "Order submission flow endpoints"),
        (name = "orders", description = "Order history and lifecycle endpoints"),
        (name = "analytics", description = "Daily sales rollup endpoints")
    ),
    paths(
        // Menu
        crate::handlers::menu::list_menu,
        crate::handlers::menu::get_menu_item,
        crate::handlers::menu::list_categories,

        // Carts
        crate::handlers::carts::create_cart,
        crate::handlers::carts::get_cart,
        crate::handlers::carts::add_item,
        crate::handlers::carts::update_quantity,
        crate::handlers::carts::remove_item,
        crate::handlers::carts::clear_cart,

        // Checkout
        crate::handlers::checkout::get_state,
        crate::handlers::checkout::begin,
        crate::handlers::checkout::set_table_number,
        crate::handlers::checkout::confirm,
        crate::handlers::checkout::cancel,

        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::mark_paid,
        crate::handlers::orders::mark_completed,

        // Analytics
        crate::handlers::analytics::daily_total,
        crate::handlers::analytics::recent_totals,
    ),
    components(
        schemas(
            // Menu types
            crate::entities::menu_item::Model,

            // Cart types
            crate::cart::CartLine,
            crate::cart::CartTotals,
            crate::services::carts::CartView,
            crate::handlers::carts::AddItemRequest,
            crate::handlers::carts::UpdateQuantityRequest,

            // Checkout types
            crate::services::checkout::CheckoutState,
            crate::services::checkout::Receipt,
            crate::handlers::checkout::TableNumberRequest,

            // Order types
            crate::services::orders::OrderView,
            crate::services::orders::OrderStatus,
            crate::handlers::orders::HistoryResponse,

            // Analytics types
            crate::handlers::analytics::DailySalesResponse,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_all_resource_groups() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("DineTab API"));
        assert!(json.contains("/api/v1/menu"));
        assert!(json.contains("/api/v1/carts"));
        assert!(json.contains("/api/v1/checkout/{cart_id}/confirm"));
        assert!(json.contains("/api/v1/orders/{id}/pay"));
        assert!(json.contains("/api/v1/analytics/daily"));
    }
}
