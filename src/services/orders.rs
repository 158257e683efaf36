use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cart::{line_total, CartLine};
use crate::entities::order;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::checkout::PAY_AT_COUNTER;

/// Derived order status. Two stored booleans collapse to exactly three
/// states: an order is never "done" before it is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Unpaid,
    Preparing,
    Completed,
}

impl OrderStatus {
    pub fn derive(payment_done: bool, order_done: bool) -> Self {
        match (payment_done, order_done) {
            (false, _) => OrderStatus::Unpaid,
            (true, false) => OrderStatus::Preparing,
            (true, true) => OrderStatus::Completed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Unpaid => "Unpaid",
            OrderStatus::Preparing => "Paid / Preparing",
            OrderStatus::Completed => "Paid / Completed",
        }
    }
}

/// Order as returned over the API: the frozen lines plus derived totals and
/// status.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub table_number: String,
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub payment_done: bool,
    pub order_done: bool,
    pub status: OrderStatus,
    pub status_label: String,
    /// Present while the order is unpaid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order history and lifecycle transitions.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }

    /// All orders for a user, newest first. A row whose frozen lines fail
    /// to parse is skipped with a warning; the rest of the history still
    /// loads.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<OrderView>, ServiceError> {
        let rows = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to list orders for user {}: {}", user_id, e);
                ServiceError::DatabaseError(e)
            })?;

        let views = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                match Self::to_view(row) {
                    Ok(view) => Some(view),
                    Err(e) => {
                        warn!("Skipping order {} with unreadable item info: {}", id, e);
                        None
                    }
                }
            })
            .collect();

        Ok(views)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderView, ServiceError> {
        let row = self.find_order(order_id).await?;
        Self::to_view(row)
    }

    /// Deletes an order, permitted only while it is unpaid and only for its
    /// owner.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: Uuid, user_id: &str) -> Result<(), ServiceError> {
        let row = self.find_order(order_id).await?;

        if row.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to a different user".to_string(),
            ));
        }
        if row.payment_done {
            return Err(ServiceError::Conflict(
                "Paid orders cannot be deleted".to_string(),
            ));
        }

        row.delete(&*self.db).await.map_err(|e| {
            error!("Failed to delete order {}: {}", order_id, e);
            ServiceError::DatabaseError(e)
        })?;

        info!("Deleted unpaid order {}", order_id);
        self.emit(Event::OrderDeleted(order_id)).await;
        Ok(())
    }

    /// Marks counter payment as settled: unpaid -> preparing.
    #[instrument(skip(self))]
    pub async fn mark_paid(&self, order_id: Uuid) -> Result<OrderView, ServiceError> {
        let row = self.find_order(order_id).await?;
        if row.payment_done {
            return Err(ServiceError::Conflict("Order is already paid".to_string()));
        }

        let mut active: order::ActiveModel = row.into();
        active.payment_done = Set(true);
        let updated = active.update(&*self.db).await.map_err(|e| {
            error!("Failed to mark order {} paid: {}", order_id, e);
            ServiceError::DatabaseError(e)
        })?;

        self.emit(Event::OrderPaid(order_id)).await;
        Self::to_view(updated)
    }

    /// Marks preparation as finished: preparing -> completed. Refused while
    /// the order is unpaid.
    #[instrument(skip(self))]
    pub async fn mark_completed(&self, order_id: Uuid) -> Result<OrderView, ServiceError> {
        let row = self.find_order(order_id).await?;
        if !row.payment_done {
            return Err(ServiceError::InvalidOperation(
                "Order must be paid before it can be completed".to_string(),
            ));
        }
        if row.order_done {
            return Err(ServiceError::Conflict(
                "Order is already completed".to_string(),
            ));
        }

        let mut active: order::ActiveModel = row.into();
        active.order_done = Set(true);
        let updated = active.update(&*self.db).await.map_err(|e| {
            error!("Failed to mark order {} completed: {}", order_id, e);
            ServiceError::DatabaseError(e)
        })?;

        self.emit(Event::OrderCompleted(order_id)).await;
        Self::to_view(updated)
    }

    async fn find_order(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to fetch order {}: {}", order_id, e);
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    fn to_view(model: order::Model) -> Result<OrderView, ServiceError> {
        let items: Vec<CartLine> = serde_json::from_value(model.item_info)?;
        let total = line_total(&items);
        let status = OrderStatus::derive(model.payment_done, model.order_done);

        Ok(OrderView {
            id: model.id,
            table_number: model.table_number,
            items,
            total,
            payment_done: model.payment_done,
            order_done: model.order_done,
            status,
            status_label: status.label().to_string(),
            instruction: (!model.payment_done).then(|| PAY_AT_COUNTER.to_string()),
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn status_derivation_covers_all_boolean_combinations() {
        assert_eq!(OrderStatus::derive(false, false), OrderStatus::Unpaid);
        // order_done without payment still reads as unpaid.
        assert_eq!(OrderStatus::derive(false, true), OrderStatus::Unpaid);
        assert_eq!(OrderStatus::derive(true, false), OrderStatus::Preparing);
        assert_eq!(OrderStatus::derive(true, true), OrderStatus::Completed);
    }

    #[test]
    fn status_labels_match_customer_facing_wording() {
        assert_eq!(OrderStatus::Unpaid.label(), "Unpaid");
        assert_eq!(OrderStatus::Preparing.label(), "Paid / Preparing");
        assert_eq!(OrderStatus::Completed.label(), "Paid / Completed");
    }

    fn order_row(item_info: serde_json::Value, payment_done: bool) -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            table_number: "12".to_string(),
            item_info,
            payment_done,
            order_done: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn view_computes_total_from_frozen_lines() {
        let row = order_row(
            json!([
                {"item_id": 1, "name": "Paneer Tikka", "price": "250", "quantity": 2},
                {"item_id": 4, "name": "Butter Naan", "price": "30", "quantity": 1}
            ]),
            false,
        );

        let view = OrderService::to_view(row).unwrap();

        assert_eq!(view.total, dec!(530));
        assert_eq!(view.status, OrderStatus::Unpaid);
        assert_eq!(view.instruction.as_deref(), Some(PAY_AT_COUNTER));
    }

    #[test]
    fn view_omits_instruction_once_paid() {
        let row = order_row(
            json!([
                {"item_id": 1, "name": "Paneer Tikka", "price": "250", "quantity": 1}
            ]),
            true,
        );

        let view = OrderService::to_view(row).unwrap();

        assert_eq!(view.status, OrderStatus::Preparing);
        assert!(view.instruction.is_none());
    }

    #[test]
    fn malformed_item_info_fails_only_that_row() {
        let row = order_row(json!("not a list of lines"), false);

        let result = OrderService::to_view(row);

        assert!(matches!(result, Err(ServiceError::SerializationError(_))));
    }

    #[tokio::test]
    async fn list_for_user_surfaces_database_errors() {
        let service = OrderService::new(Arc::new(DatabaseConnection::Disconnected), None);

        let result = service.list_for_user("user-1").await;

        assert!(matches!(result, Err(ServiceError::DatabaseError(_))));
    }
}
