use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{stock_entry, stock_movement};

/// Events emitted by the ledger and document services.
///
/// Events are sent after the owning transaction commits, so a consumer never
/// observes an event for a change that was rolled back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Ledger events
    StockAdded {
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: Decimal,
        new_on_hand: Decimal,
    },
    StockRemoved {
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: Decimal,
        new_on_hand: Decimal,
    },
    StockReserved {
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: Decimal,
        available_after: Decimal,
    },
    StockReleased {
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: Decimal,
        available_after: Decimal,
    },
    LowStockDetected {
        product_id: Uuid,
        warehouse_id: Uuid,
        on_hand: Decimal,
        reorder_level: Decimal,
    },

    // Movement log events
    MovementRecorded {
        movement_id: Uuid,
        reference_number: String,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: Decimal,
    },

    // Document events
    GoodsReceiptVerified {
        receipt_id: Uuid,
        has_discrepancy: bool,
    },
    GoodsReceiptApproved {
        receipt_id: Uuid,
        purchase_order_id: Uuid,
        lines_posted: usize,
    },
    PurchaseOrderStatusChanged {
        purchase_order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    TransferShipped {
        transfer_id: Uuid,
        from_warehouse_id: Uuid,
    },
    TransferReceived {
        transfer_id: Uuid,
        to_warehouse_id: Uuid,
    },
    AdjustmentApproved {
        adjustment_id: Uuid,
        lines_posted: usize,
    },

    // Production material events
    MaterialsReserved {
        production_order_id: Uuid,
        item_count: usize,
    },
    MaterialShortageDetected {
        production_order_id: Uuid,
        product_id: Uuid,
        required_quantity: Decimal,
    },
    MaterialIssued {
        production_order_id: Uuid,
        item_id: Uuid,
        quantity: Decimal,
    },
    MaterialReturned {
        production_order_id: Uuid,
        item_id: Uuid,
        quantity: Decimal,
    },
    ProductionOrderCompleted {
        production_order_id: Uuid,
        completed_at: DateTime<Utc>,
    },
}

impl Event {
    /// Audit event for a freshly appended movement row.
    pub fn movement_recorded(movement: &stock_movement::Model) -> Self {
        Event::MovementRecorded {
            movement_id: movement.id,
            reference_number: movement.reference_number.clone(),
            product_id: movement.product_id,
            warehouse_id: movement.warehouse_id,
            quantity: movement.quantity,
        }
    }

    /// Low-stock alert built from a ledger entry after a draw-down.
    pub fn low_stock(entry: &stock_entry::Model) -> Self {
        Event::LowStockDetected {
            product_id: entry.product_id,
            warehouse_id: entry.warehouse_id,
            on_hand: entry.quantity,
            reorder_level: entry.reorder_level,
        }
    }
}

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

    /// Sends an event, logging instead of failing when the channel is gone.
    ///
    /// Document services call this after commit; a dropped consumer must not
    /// turn an already-committed transition into an error.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }

    /// Sends a batch of events in order, logging any that are dropped.
    pub async fn send_all_or_log(&self, events: Vec<Event>) {
        for event in events {
            self.send_or_log(event).await;
        }
    }
}

/// Creates a bounded event channel with the sender side wrapped.
pub fn event_channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains incoming events and logs them.
///
/// Spawn this on the runtime next to the services; replace with a real
/// handler (outbox, webhook fan-out) in an embedding application.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::LowStockDetected {
                product_id,
                warehouse_id,
                on_hand,
                reorder_level,
            } => {
                warn!(
                    "Low stock: product {} at warehouse {} has {} on hand (reorder level {})",
                    product_id, warehouse_id, on_hand, reorder_level
                );
            }
            Event::MaterialShortageDetected {
                production_order_id,
                product_id,
                required_quantity,
            } => {
                warn!(
                    "Material shortage: production order {} needs {} of product {}",
                    production_order_id, required_quantity, product_id
                );
            }
            other => match serde_json::to_string(other) {
                Ok(payload) => info!("Received event: {}", payload),
                Err(_) => info!("Received event: {:?}", other),
            },
        }
    }

    info!("Event channel closed, stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_or_log_does_not_fail_on_closed_channel() {
        let (sender, rx) = event_channel(1);
        drop(rx);
        sender
            .send_or_log(Event::StockAdded {
                product_id: Uuid::new_v4(),
                warehouse_id: Uuid::new_v4(),
                quantity: dec!(5),
                new_on_hand: dec!(5),
            })
            .await;
    }

    #[tokio::test]
    async fn events_round_trip_through_channel() {
        let (sender, mut rx) = event_channel(4);
        let receipt_id = Uuid::new_v4();
        sender
            .send(Event::GoodsReceiptVerified {
                receipt_id,
                has_discrepancy: false,
            })
            .await
            .unwrap();
        match rx.recv().await.unwrap() {
            Event::GoodsReceiptVerified { receipt_id: id, .. } => assert_eq!(id, receipt_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
