pub mod analytics;
pub mod carts;
pub mod checkout;
pub mod common;
pub mod menu;
pub mod orders;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub menu: Arc<crate::services::menu::MenuService>,
    pub carts: Arc<crate::services::carts::CartService>,
    pub checkout: Arc<crate::services::checkout::CheckoutService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub sales: Arc<crate::services::sales::SalesService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let menu = Arc::new(crate::services::menu::MenuService::new(db_pool.clone()));
        let carts = Arc::new(crate::services::carts::CartService::new(menu.clone()));
        let checkout = Arc::new(crate::services::checkout::CheckoutService::new(
            db_pool.clone(),
            carts.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            Some(event_sender),
        ));
        let sales = Arc::new(crate::services::sales::SalesService::new(db_pool));

        Self {
            menu,
            carts,
            checkout,
            orders,
            sales,
        }
    }
}
