use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cart::line_total;
use crate::entities::order;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::carts::CartService;

/// Receipt returned once an order is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Receipt {
    pub order_id: Uuid,
    pub table_number: String,
    pub total: Decimal,
    pub instruction: String,
}

pub const PAY_AT_COUNTER: &str = "Please pay at the counter to complete your order.";

/// Submission flow for one cart, as a single tagged state.
///
/// Table-number capture is split from confirmation so an order can never be
/// submitted without seating context, and confirmation is split from the
/// write so the caller can abort after seeing the final total without any
/// remote call having happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    Idle,
    AwaitingTableNumber,
    AwaitingConfirmation { table_number: String },
    Submitting { table_number: String },
    Completed { receipt: Receipt },
}

/// Drives the order submission flow: table-number capture, confirmation,
/// the transactional order insert, and the receipt.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    flows: Arc<DashMap<Uuid, CheckoutState>>,
    cart_service: Arc<CartService>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cart_service: Arc<CartService>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            flows: Arc::new(DashMap::new()),
            cart_service,
            event_sender,
        }
    }

    /// Current flow state for a cart. A cart that never started checkout is
    /// `Idle`.
    #[instrument(skip(self))]
    pub fn state(&self, cart_id: Uuid) -> Result<CheckoutState, ServiceError> {
        // Validates the cart exists before reporting a state for it.
        self.cart_service.get_cart(cart_id)?;
        Ok(self
            .flows
            .get(&cart_id)
            .map(|s| s.clone())
            .unwrap_or(CheckoutState::Idle))
    }

    /// `Idle -> AwaitingTableNumber`. Refused while the cart is empty: the
    /// flow stays `Idle` and no remote call is made.
    #[instrument(skip(self))]
    pub fn begin(&self, cart_id: Uuid) -> Result<CheckoutState, ServiceError> {
        let cart = self.cart_service.get_cart(cart_id)?;
        if matches!(
            self.flows.get(&cart_id).map(|s| s.clone()),
            Some(CheckoutState::Submitting { .. })
        ) {
            return Err(ServiceError::Conflict(
                "A submission is already in progress for this cart".to_string(),
            ));
        }
        if cart.lines.is_empty() {
            self.flows.insert(cart_id, CheckoutState::Idle);
            return Err(ServiceError::CheckoutError(
                "Cart is empty; add items before placing an order".to_string(),
            ));
        }

        let next = CheckoutState::AwaitingTableNumber;
        self.flows.insert(cart_id, next.clone());
        Ok(next)
    }

    /// `AwaitingTableNumber -> AwaitingConfirmation`, guarded by a
    /// non-empty trimmed table number. On validation failure the flow stays
    /// where it is and the error carries the field message.
    #[instrument(skip(self))]
    pub fn set_table_number(
        &self,
        cart_id: Uuid,
        input: &str,
    ) -> Result<CheckoutState, ServiceError> {
        self.cart_service.get_cart(cart_id)?;

        let current = self
            .flows
            .get(&cart_id)
            .map(|s| s.clone())
            .unwrap_or(CheckoutState::Idle);
        match current {
            CheckoutState::AwaitingTableNumber | CheckoutState::AwaitingConfirmation { .. } => {}
            CheckoutState::Submitting { .. } => {
                return Err(ServiceError::Conflict(
                    "A submission is already in progress for this cart".to_string(),
                ));
            }
            _ => {
                return Err(ServiceError::CheckoutError(
                    "Checkout has not been started for this cart".to_string(),
                ));
            }
        }

        let table_number = input.trim();
        if table_number.is_empty() {
            return Err(ServiceError::ValidationError(
                "Table number is required".to_string(),
            ));
        }

        let next = CheckoutState::AwaitingConfirmation {
            table_number: table_number.to_string(),
        };
        self.flows.insert(cart_id, next.clone());
        Ok(next)
    }

    /// `AwaitingConfirmation -> Submitting -> Completed`, writing the order
    /// row inside a transaction.
    ///
    /// On a write failure the flow returns to `AwaitingConfirmation` with
    /// the cart untouched, so the caller can simply confirm again. On
    /// success the cart is cleared and an `OrderPlaced` event carries the
    /// total to the sales rollup.
    #[instrument(skip(self))]
    pub async fn confirm(
        &self,
        cart_id: Uuid,
        user_id: Option<&str>,
    ) -> Result<Receipt, ServiceError> {
        let user_id = user_id.ok_or_else(|| {
            ServiceError::CheckoutError("A user id is required to place an order".to_string())
        })?;

        // Single winner: the flow moves to Submitting under the map lock, so
        // two concurrent confirms can never both reach the order write.
        let table_number = self.take_for_submission(cart_id)?;

        let lines = match self.cart_service.lines(cart_id) {
            Ok(lines) => lines,
            Err(e) => {
                self.flows
                    .insert(cart_id, CheckoutState::AwaitingConfirmation { table_number });
                return Err(e);
            }
        };
        if lines.is_empty() {
            self.flows.insert(cart_id, CheckoutState::Idle);
            return Err(ServiceError::CheckoutError(
                "Cart is empty; add items before placing an order".to_string(),
            ));
        }
        let total = line_total(&lines);

        match self
            .insert_order(user_id, &table_number, &lines)
            .await
        {
            Ok(order_id) => {
                let receipt = Receipt {
                    order_id,
                    table_number: table_number.clone(),
                    total,
                    instruction: PAY_AT_COUNTER.to_string(),
                };
                self.flows.insert(
                    cart_id,
                    CheckoutState::Completed {
                        receipt: receipt.clone(),
                    },
                );
                // Cart is only cleared once the order is committed.
                self.cart_service.clear_cart(cart_id)?;
                info!(
                    "Order {} placed for table {} with total {}",
                    order_id, table_number, total
                );
                self.event_sender
                    .send_or_log(Event::OrderPlaced {
                        order_id,
                        table_number,
                        total,
                    })
                    .await;
                Ok(receipt)
            }
            Err(e) => {
                // Back to the confirmation step; the cart is untouched and
                // the caller may re-confirm manually.
                error!("Order submission failed for cart {}: {}", cart_id, e);
                self.flows
                    .insert(cart_id, CheckoutState::AwaitingConfirmation { table_number });
                Err(e)
            }
        }
    }

    /// Resets the flow to `Idle`, discarding the table number and any error
    /// context. Never mutates the cart. An in-flight write is not aborted.
    #[instrument(skip(self))]
    pub fn cancel(&self, cart_id: Uuid) -> Result<CheckoutState, ServiceError> {
        self.cart_service.get_cart(cart_id)?;
        self.flows.insert(cart_id, CheckoutState::Idle);
        Ok(CheckoutState::Idle)
    }

    /// Atomically moves `AwaitingConfirmation -> Submitting`, returning the
    /// captured table number. The read and the write happen under one map
    /// lock, so exactly one caller wins the transition; any other sees a
    /// conflict.
    fn take_for_submission(&self, cart_id: Uuid) -> Result<String, ServiceError> {
        let mut entry = self.flows.entry(cart_id).or_insert(CheckoutState::Idle);
        let current = entry.value().clone();
        match current {
            CheckoutState::AwaitingConfirmation { table_number } => {
                *entry.value_mut() = CheckoutState::Submitting {
                    table_number: table_number.clone(),
                };
                Ok(table_number)
            }
            CheckoutState::Submitting { .. } => Err(ServiceError::Conflict(
                "A submission is already in progress for this cart".to_string(),
            )),
            _ => Err(ServiceError::CheckoutError(
                "Nothing to confirm; provide a table number first".to_string(),
            )),
        }
    }

    async fn insert_order(
        &self,
        user_id: &str,
        table_number: &str,
        lines: &[crate::cart::CartLine],
    ) -> Result<Uuid, ServiceError> {
        let item_info = serde_json::to_value(lines)?;
        let order_id = Uuid::new_v4();

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id.to_string()),
            table_number: Set(table_number.to_string()),
            item_info: Set(item_info),
            payment_done: Set(false),
            order_done: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!("Failed to insert order: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit order transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        Ok(order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartLine;
    use crate::services::menu::MenuService;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    fn services() -> (CheckoutService, Arc<CartService>) {
        let db = Arc::new(DatabaseConnection::Disconnected);
        let menu = Arc::new(MenuService::new(db.clone()));
        let carts = Arc::new(CartService::new(menu));
        let (tx, _rx) = mpsc::channel(16);
        let checkout = CheckoutService::new(db, carts.clone(), Arc::new(EventSender::new(tx)));
        (checkout, carts)
    }

    fn seed_cart_with(carts: &Arc<CartService>, lines: Vec<CartLine>) -> Uuid {
        let view = carts.create_cart();
        let id = view.id;
        for line in lines {
            carts.push_line_for_tests(id, line);
        }
        id
    }

    fn sample_lines() -> Vec<CartLine> {
        vec![
            CartLine {
                item_id: 1,
                name: "Paneer Tikka".into(),
                price: dec!(250),
                quantity: 2,
            },
            CartLine {
                item_id: 4,
                name: "Butter Naan".into(),
                price: dec!(30),
                quantity: 1,
            },
        ]
    }

    #[test]
    fn begin_with_empty_cart_is_refused_and_stays_idle() {
        let (checkout, carts) = services();
        let cart_id = carts.create_cart().id;

        let err = checkout.begin(cart_id).unwrap_err();

        assert!(matches!(err, ServiceError::CheckoutError(_)));
        assert_eq!(checkout.state(cart_id).unwrap(), CheckoutState::Idle);
    }

    #[test]
    fn begin_with_items_awaits_table_number() {
        let (checkout, carts) = services();
        let cart_id = seed_cart_with(&carts, sample_lines());

        let state = checkout.begin(cart_id).unwrap();

        assert_eq!(state, CheckoutState::AwaitingTableNumber);
    }

    #[test]
    fn whitespace_table_number_is_rejected_in_place() {
        let (checkout, carts) = services();
        let cart_id = seed_cart_with(&carts, sample_lines());
        checkout.begin(cart_id).unwrap();

        let err = checkout.set_table_number(cart_id, "   ").unwrap_err();

        assert!(matches!(err, ServiceError::ValidationError(_)));
        assert_eq!(
            checkout.state(cart_id).unwrap(),
            CheckoutState::AwaitingTableNumber
        );
    }

    #[test]
    fn table_number_is_trimmed_before_storage() {
        let (checkout, carts) = services();
        let cart_id = seed_cart_with(&carts, sample_lines());
        checkout.begin(cart_id).unwrap();

        let state = checkout.set_table_number(cart_id, "  12  ").unwrap();

        assert_eq!(
            state,
            CheckoutState::AwaitingConfirmation {
                table_number: "12".to_string()
            }
        );
    }

    #[test]
    fn set_table_number_requires_started_flow() {
        let (checkout, carts) = services();
        let cart_id = seed_cart_with(&carts, sample_lines());

        let err = checkout.set_table_number(cart_id, "12").unwrap_err();

        assert!(matches!(err, ServiceError::CheckoutError(_)));
    }

    #[tokio::test]
    async fn failed_submission_returns_to_confirmation_with_cart_unchanged() {
        let (checkout, carts) = services();
        let cart_id = seed_cart_with(&carts, sample_lines());
        checkout.begin(cart_id).unwrap();
        checkout.set_table_number(cart_id, "12").unwrap();

        // Disconnected database: the insert must fail.
        let err = checkout.confirm(cart_id, Some("user-1")).await.unwrap_err();
        assert!(matches!(err, ServiceError::DatabaseError(_)));

        assert_eq!(
            checkout.state(cart_id).unwrap(),
            CheckoutState::AwaitingConfirmation {
                table_number: "12".to_string()
            }
        );
        let cart = carts.get_cart(cart_id).unwrap();
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.totals.total_price, dec!(530));
    }

    #[tokio::test]
    async fn confirm_without_user_id_is_refused() {
        let (checkout, carts) = services();
        let cart_id = seed_cart_with(&carts, sample_lines());
        checkout.begin(cart_id).unwrap();
        checkout.set_table_number(cart_id, "12").unwrap();

        let err = checkout.confirm(cart_id, None).await.unwrap_err();

        assert!(matches!(err, ServiceError::CheckoutError(_)));
    }

    #[test]
    fn only_one_caller_wins_the_submitting_transition() {
        let (checkout, carts) = services();
        let cart_id = seed_cart_with(&carts, sample_lines());
        checkout.begin(cart_id).unwrap();
        checkout.set_table_number(cart_id, "12").unwrap();

        let first = checkout.take_for_submission(cart_id).unwrap();
        assert_eq!(first, "12");
        assert_eq!(
            checkout.state(cart_id).unwrap(),
            CheckoutState::Submitting {
                table_number: "12".to_string()
            }
        );

        // A second taker sees Submitting, never AwaitingConfirmation.
        let second = checkout.take_for_submission(cart_id).unwrap_err();
        assert!(matches!(second, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn concurrent_confirm_is_rejected_while_submitting() {
        let (checkout, carts) = services();
        let cart_id = seed_cart_with(&carts, sample_lines());
        checkout.flows.insert(
            cart_id,
            CheckoutState::Submitting {
                table_number: "12".to_string(),
            },
        );

        let err = checkout.confirm(cart_id, Some("user-1")).await.unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn cancel_resets_flow_without_touching_cart() {
        let (checkout, carts) = services();
        let cart_id = seed_cart_with(&carts, sample_lines());
        checkout.begin(cart_id).unwrap();
        checkout.set_table_number(cart_id, "12").unwrap();

        let state = checkout.cancel(cart_id).unwrap();

        assert_eq!(state, CheckoutState::Idle);
        let cart = carts.get_cart(cart_id).unwrap();
        assert_eq!(cart.totals.total_items, 3);
    }
}
