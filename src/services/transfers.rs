use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::stock_movement::MovementType;
use crate::entities::warehouse_transfer::{
    self, Entity as WarehouseTransferEntity, TransferStatus,
};
use crate::entities::warehouse_transfer_item::{self, Entity as WarehouseTransferItemEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::movements::NewMovement;
use crate::services::{movements, sequences, stock_ledger};

const REFERENCE_PREFIX: &str = "TRF";
pub const DOCUMENT_TYPE: &str = "warehouse_transfer";

#[derive(Debug, Clone)]
pub struct NewTransferLine {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

/// Two-phase warehouse transfer: draft -> in_transit (ship) -> completed
/// (receive). Shipping draws down the source warehouse; receiving lands the
/// goods at the destination. Each phase is one transaction.
#[derive(Clone)]
pub struct TransferService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl TransferService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, lines))]
    pub async fn create(
        &self,
        from_warehouse_id: Uuid,
        to_warehouse_id: Uuid,
        lines: Vec<NewTransferLine>,
        notes: Option<String>,
    ) -> Result<warehouse_transfer::Model, ServiceError> {
        if from_warehouse_id == to_warehouse_id {
            return Err(ServiceError::ValidationError(
                "Transfer source and destination must differ".to_string(),
            ));
        }
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "Transfer needs at least one line".to_string(),
            ));
        }
        for line in &lines {
            if line.quantity <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Transfer quantity must be positive for product {}",
                    line.product_id
                )));
            }
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let transfer_number = sequences::next_reference(&txn, REFERENCE_PREFIX).await?;
        let now = Utc::now();
        let transfer = warehouse_transfer::ActiveModel {
            id: Set(Uuid::new_v4()),
            transfer_number: Set(transfer_number.clone()),
            from_warehouse_id: Set(from_warehouse_id),
            to_warehouse_id: Set(to_warehouse_id),
            status: Set(TransferStatus::Draft.as_str().to_string()),
            shipped_at: Set(None),
            shipped_by: Set(None),
            received_at: Set(None),
            received_by: Set(None),
            notes: Set(notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = transfer.insert(&txn).await.map_err(ServiceError::db_error)?;

        for line in lines {
            let item = warehouse_transfer_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                transfer_id: Set(created.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                created_at: Set(now),
                updated_at: Set(now),
            };
            item.insert(&txn).await.map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!("Warehouse transfer created: {}", transfer_number);
        Ok(created)
    }

    /// Ships a draft transfer: removes each line from the source warehouse
    /// and records an outbound transfer movement. All-or-nothing.
    #[instrument(skip(self))]
    pub async fn ship(
        &self,
        transfer_id: Uuid,
        shipped_by: Uuid,
    ) -> Result<warehouse_transfer::Model, ServiceError> {
        let db = &*self.db;
        let transfer = self.get(transfer_id).await?;

        match TransferStatus::from_str(&transfer.status) {
            Some(TransferStatus::Draft) => {}
            _ => return Err(ServiceError::invalid_transition(transfer.status, "ship")),
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let items = self.items_in(&txn, transfer_id).await?;

        let mut ledger_events = Vec::new();
        for item in &items {
            let entry = stock_ledger::get_entry(&txn, item.product_id, transfer.from_warehouse_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::InsufficientStock(format!(
                        "No stock of product {} at warehouse {}",
                        item.product_id, transfer.from_warehouse_id
                    ))
                })?;
            let balance_before = entry.quantity;
            let entry = stock_ledger::remove_stock(&txn, entry, item.quantity).await?;

            let movement = movements::record(
                &txn,
                NewMovement {
                    product_id: item.product_id,
                    warehouse_id: transfer.from_warehouse_id,
                    movement_type: MovementType::TransferOut,
                    quantity: -item.quantity,
                    unit_cost: Decimal::ZERO,
                    balance_before,
                    document_type: DOCUMENT_TYPE,
                    document_id: transfer.id,
                    performed_by: Some(shipped_by),
                    notes: Some(format!("Transfer {} shipped", transfer.transfer_number)),
                },
            )
            .await?;

            ledger_events.push(Event::StockRemoved {
                product_id: item.product_id,
                warehouse_id: transfer.from_warehouse_id,
                quantity: item.quantity,
                new_on_hand: entry.quantity,
            });
            ledger_events.push(Event::movement_recorded(&movement));
            if entry.is_low_stock() {
                ledger_events.push(Event::low_stock(&entry));
            }
        }

        let from_warehouse_id = transfer.from_warehouse_id;
        let mut active: warehouse_transfer::ActiveModel = transfer.into();
        active.status = Set(TransferStatus::InTransit.as_str().to_string());
        active.shipped_at = Set(Some(Utc::now()));
        active.shipped_by = Set(Some(shipped_by));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("ledger.transfers.shipped", 1);

        if let Some(sender) = &self.event_sender {
            sender.send_all_or_log(ledger_events).await;
            sender
                .send_or_log(Event::TransferShipped {
                    transfer_id,
                    from_warehouse_id,
                })
                .await;
        }

        info!("Transfer shipped: {}", updated.transfer_number);
        Ok(updated)
    }

    /// Receives an in-transit transfer: lands each line at the destination
    /// warehouse and records an inbound transfer movement.
    #[instrument(skip(self))]
    pub async fn receive(
        &self,
        transfer_id: Uuid,
        received_by: Uuid,
    ) -> Result<warehouse_transfer::Model, ServiceError> {
        let db = &*self.db;
        let transfer = self.get(transfer_id).await?;

        match TransferStatus::from_str(&transfer.status) {
            Some(TransferStatus::InTransit) => {}
            _ => return Err(ServiceError::invalid_transition(transfer.status, "receive")),
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let items = self.items_in(&txn, transfer_id).await?;

        let mut ledger_events = Vec::new();
        for item in &items {
            let entry =
                stock_ledger::get_or_create(&txn, item.product_id, transfer.to_warehouse_id)
                    .await?;
            let balance_before = entry.quantity;
            let entry = stock_ledger::add_stock(&txn, entry, item.quantity).await?;

            let movement = movements::record(
                &txn,
                NewMovement {
                    product_id: item.product_id,
                    warehouse_id: transfer.to_warehouse_id,
                    movement_type: MovementType::TransferIn,
                    quantity: item.quantity,
                    unit_cost: Decimal::ZERO,
                    balance_before,
                    document_type: DOCUMENT_TYPE,
                    document_id: transfer.id,
                    performed_by: Some(received_by),
                    notes: Some(format!("Transfer {} received", transfer.transfer_number)),
                },
            )
            .await?;

            ledger_events.push(Event::StockAdded {
                product_id: item.product_id,
                warehouse_id: transfer.to_warehouse_id,
                quantity: item.quantity,
                new_on_hand: entry.quantity,
            });
            ledger_events.push(Event::movement_recorded(&movement));
        }

        let to_warehouse_id = transfer.to_warehouse_id;
        let mut active: warehouse_transfer::ActiveModel = transfer.into();
        active.status = Set(TransferStatus::Completed.as_str().to_string());
        active.received_at = Set(Some(Utc::now()));
        active.received_by = Set(Some(received_by));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("ledger.transfers.received", 1);

        if let Some(sender) = &self.event_sender {
            sender.send_all_or_log(ledger_events).await;
            sender
                .send_or_log(Event::TransferReceived {
                    transfer_id,
                    to_warehouse_id,
                })
                .await;
        }

        info!("Transfer received: {}", updated.transfer_number);
        Ok(updated)
    }

    pub async fn get(
        &self,
        transfer_id: Uuid,
    ) -> Result<warehouse_transfer::Model, ServiceError> {
        WarehouseTransferEntity::find_by_id(transfer_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Transfer {} not found", transfer_id)))
    }

    pub async fn get_items(
        &self,
        transfer_id: Uuid,
    ) -> Result<Vec<warehouse_transfer_item::Model>, ServiceError> {
        self.items_in(&*self.db, transfer_id).await
    }

    async fn items_in<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        transfer_id: Uuid,
    ) -> Result<Vec<warehouse_transfer_item::Model>, ServiceError> {
        WarehouseTransferItemEntity::find()
            .filter(warehouse_transfer_item::Column::TransferId.eq(transfer_id))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)
    }
}
