use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::menu_item;

/// One menu item plus a quantity within an in-progress order.
///
/// Menu fields are copied in by value when the line is created, so a later
/// menu edit never changes what a cart (or a submitted order) says was
/// bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub item_id: i32,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// Derived cart totals. Recomputed on every query, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartTotals {
    pub total_items: u32,
    pub total_price: Decimal,
}

/// An in-progress order: lines keyed by menu item id.
///
/// Invariant: at most one line per `item_id`, and every line has
/// `quantity >= 1`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            lines: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds one unit of the given menu item: an existing line is bumped by
    /// one, otherwise a new line with quantity 1 is appended. Each call is
    /// one "add one more"; repeated calls keep incrementing.
    pub fn add_item(&mut self, item: &menu_item::Model) {
        match self.lines.iter_mut().find(|l| l.item_id == item.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine {
                item_id: item.id,
                name: item.name.clone(),
                price: item.price,
                quantity: 1,
            }),
        }
    }

    /// Sets a line's quantity exactly. Anything below 1 removes the line,
    /// identically to `remove_item`; anything above `u32::MAX` is clamped so
    /// a stored quantity can never wrap to 0. Unknown `item_id` is a no-op.
    pub fn update_quantity(&mut self, item_id: i32, quantity: i64) {
        if quantity < 1 {
            self.remove_item(item_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item_id) {
            line.quantity = quantity;
        }
    }

    /// Deletes the line if present; no-op otherwise.
    pub fn remove_item(&mut self, item_id: i32) {
        self.lines.retain(|l| l.item_id != item_id);
    }

    /// Empties all lines. Invoked after a successful order submission.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals {
            total_items: self.lines.iter().map(|l| l.quantity).sum(),
            total_price: line_total(&self.lines),
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// Sum of `price * quantity` over a set of lines. Shared between live carts
/// and frozen order snapshots so the two can never disagree.
pub fn line_total(lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .map(|l| l.price * Decimal::from(l.quantity))
        .sum()
}
