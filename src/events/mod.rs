use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::services::sales::SalesService;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating a channel failure.
    /// Used on paths where the triggering operation has already committed
    /// and must not be failed retroactively.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            error!("Failed to send event {:?}: {}", event, e);
        }
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// An order was committed. Carries the frozen total so the sales rollup
    /// never has to re-read (and possibly re-parse) the order row.
    OrderPlaced {
        order_id: Uuid,
        table_number: String,
        total: Decimal,
    },
    OrderPaid(Uuid),
    OrderCompleted(Uuid),
    OrderDeleted(Uuid),
}

/// Processes events from the event channel. Spawned once at startup; runs
/// until every sender is dropped.
///
/// This loop runs strictly after the transactions that emitted the events
/// have committed, so a failing handler can only under-count a rollup,
/// never roll back an order.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, sales_service: Arc<SalesService>) {
    info!("Event processing loop started");

    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderPlaced {
                order_id,
                table_number,
                total,
            } => {
                info!(
                    "Order placed: id={}, table={}, total={}",
                    order_id, table_number, total
                );
                if let Err(e) = sales_service.record_sale(total, None).await {
                    // Accepted inconsistency: the order stays committed and
                    // the daily total is under-counted until reconciled.
                    error!(
                        "Failed to record sale for order {}: total={}, error={}",
                        order_id, total, e
                    );
                }
            }
            Event::OrderPaid(order_id) => {
                info!("Order paid: {}", order_id);
            }
            Event::OrderCompleted(order_id) => {
                info!("Order completed: {}", order_id);
            }
            Event::OrderDeleted(order_id) => {
                info!("Order deleted: {}", order_id);
            }
        }
    }

    warn!("Event processing loop has ended");
}
