use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cart::{Cart, CartLine, CartTotals};
use crate::errors::ServiceError;
use crate::services::menu::MenuService;

/// Cart as returned over the API: lines plus derived totals.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartView {
    pub id: Uuid,
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id,
            lines: cart.lines.clone(),
            totals: cart.totals(),
        }
    }
}

/// In-memory cart store, one `Cart` per id.
///
/// Carts are session-scoped scratch state and are never persisted; only a
/// submitted order makes it to the database.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<DashMap<Uuid, Cart>>,
    menu_service: Arc<MenuService>,
}

impl CartService {
    pub fn new(menu_service: Arc<MenuService>) -> Self {
        Self {
            carts: Arc::new(DashMap::new()),
            menu_service,
        }
    }

    #[instrument(skip(self))]
    pub fn create_cart(&self) -> CartView {
        let cart = Cart::new();
        let view = CartView::from(&cart);
        info!("Created cart {}", cart.id);
        self.carts.insert(cart.id, cart);
        view
    }

    #[instrument(skip(self))]
    pub fn get_cart(&self, cart_id: Uuid) -> Result<CartView, ServiceError> {
        self.carts
            .get(&cart_id)
            .map(|cart| CartView::from(&*cart))
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))
    }

    /// Adds one unit of a menu item, copying the menu fields into the line.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        menu_item_id: i32,
    ) -> Result<CartView, ServiceError> {
        let item = self.menu_service.get_item(menu_item_id).await?;

        let mut cart = self
            .carts
            .get_mut(&cart_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;
        cart.add_item(&item);
        Ok(CartView::from(&*cart))
    }

    /// Sets a line's quantity; below 1 removes the line. Unknown item ids
    /// are a no-op, unknown carts an error.
    #[instrument(skip(self))]
    pub fn update_quantity(
        &self,
        cart_id: Uuid,
        item_id: i32,
        quantity: i64,
    ) -> Result<CartView, ServiceError> {
        let mut cart = self
            .carts
            .get_mut(&cart_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;
        cart.update_quantity(item_id, quantity);
        Ok(CartView::from(&*cart))
    }

    #[instrument(skip(self))]
    pub fn remove_item(&self, cart_id: Uuid, item_id: i32) -> Result<CartView, ServiceError> {
        let mut cart = self
            .carts
            .get_mut(&cart_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;
        cart.remove_item(item_id);
        Ok(CartView::from(&*cart))
    }

    #[instrument(skip(self))]
    pub fn clear_cart(&self, cart_id: Uuid) -> Result<CartView, ServiceError> {
        let mut cart = self
            .carts
            .get_mut(&cart_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;
        cart.clear();
        Ok(CartView::from(&*cart))
    }

    /// Injects a pre-built line, bypassing the menu lookup.
    #[cfg(test)]
    pub(crate) fn push_line_for_tests(&self, cart_id: Uuid, line: CartLine) {
        if let Some(mut cart) = self.carts.get_mut(&cart_id) {
            cart.lines.push(line);
        }
    }

    /// Snapshot of the current lines, for freezing into an order.
    pub fn lines(&self, cart_id: Uuid) -> Result<Vec<CartLine>, ServiceError> {
        self.carts
            .get(&cart_id)
            .map(|cart| cart.lines.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))
    }
}
