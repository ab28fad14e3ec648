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

use crate::entities::goods_receipt_item::{
    self, DiscrepancyType, Entity as GoodsReceiptItemEntity,
};
use crate::entities::goods_receipt_note::{self, Entity as GoodsReceiptNoteEntity, ReceiptStatus};
use crate::entities::purchase_order::PurchaseOrderStatus;
use crate::entities::purchase_order_item::{self, Entity as PurchaseOrderItemEntity};
use crate::entities::stock_movement::MovementType;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::movements::NewMovement;
use crate::services::purchase_orders::PurchaseOrderService;
use crate::services::{movements, purchase_orders, sequences, stock_ledger};

const REFERENCE_PREFIX: &str = "GRN";
pub const DOCUMENT_TYPE: &str = "goods_receipt_note";

/// A received line reported against a purchase order item.
#[derive(Debug, Clone)]
pub struct ReceivedLine {
    pub purchase_order_item_id: Uuid,
    pub quantity_received: Decimal,
}

/// Goods receipt workflow: draft -> verified | discrepancy -> approved.
///
/// Approval is the ledger-touching transition: inside one transaction every
/// accepted line adds stock, appends an inbound movement, and rolls the
/// originating purchase order's received/remaining quantities forward. Any
/// failure aborts the whole document.
#[derive(Clone)]
pub struct GoodsReceiptService {
    db: Arc<DatabaseConnection>,
    purchase_orders: PurchaseOrderService,
    event_sender: Option<EventSender>,
}

impl GoodsReceiptService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        let purchase_orders = PurchaseOrderService::new(db.clone(), event_sender.clone());
        Self {
            db,
            purchase_orders,
            event_sender,
        }
    }

    /// Creates a draft receipt against an approved purchase order.
    ///
    /// `quantity_accepted` starts equal to `quantity_received`; adjust it
    /// with [`set_accepted_quantity`] before approval to refuse part of a
    /// delivery.
    #[instrument(skip(self, lines))]
    pub async fn create(
        &self,
        purchase_order_id: Uuid,
        warehouse_id: Uuid,
        lines: Vec<ReceivedLine>,
        received_by: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<goods_receipt_note::Model, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "Goods receipt needs at least one line".to_string(),
            ));
        }

        let order = self.purchase_orders.get(purchase_order_id).await?;
        let order_status = PurchaseOrderStatus::from_str(&order.status)
            .ok_or_else(|| ServiceError::InternalError(format!(
                "Purchase order {} has unknown status '{}'",
                order.id, order.status
            )))?;
        if !order_status.is_receivable() {
            return Err(ServiceError::invalid_transition(
                order.status,
                "receive against",
            ));
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let receipt_number = sequences::next_reference(&txn, REFERENCE_PREFIX).await?;
        let now = Utc::now();
        let receipt = goods_receipt_note::ActiveModel {
            id: Set(Uuid::new_v4()),
            receipt_number: Set(receipt_number.clone()),
            purchase_order_id: Set(purchase_order_id),
            warehouse_id: Set(warehouse_id),
            status: Set(ReceiptStatus::Draft.as_str().to_string()),
            has_discrepancy: Set(false),
            received_by: Set(received_by),
            verified_at: Set(None),
            verified_by: Set(None),
            approved_at: Set(None),
            approved_by: Set(None),
            notes: Set(notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = receipt.insert(&txn).await.map_err(ServiceError::db_error)?;

        for line in lines {
            if line.quantity_received < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Received quantity cannot be negative".to_string(),
                ));
            }
            let po_item = PurchaseOrderItemEntity::find_by_id(line.purchase_order_item_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Purchase order item {} not found",
                        line.purchase_order_item_id
                    ))
                })?;
            if po_item.purchase_order_id != purchase_order_id {
                return Err(ServiceError::ValidationError(format!(
                    "Purchase order item {} does not belong to order {}",
                    po_item.id, purchase_order_id
                )));
            }

            let item = goods_receipt_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                receipt_id: Set(created.id),
                purchase_order_item_id: Set(po_item.id),
                product_id: Set(po_item.product_id),
                quantity_ordered: Set(po_item.quantity_remaining),
                quantity_received: Set(line.quantity_received),
                quantity_accepted: Set(line.quantity_received),
                discrepancy_quantity: Set(Decimal::ZERO),
                discrepancy_type: Set(None),
                notes: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            item.insert(&txn).await.map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!("Goods receipt created: {}", receipt_number);
        Ok(created)
    }

    /// Overrides the accepted quantity on a line of an unapproved receipt.
    #[instrument(skip(self))]
    pub async fn set_accepted_quantity(
        &self,
        item_id: Uuid,
        quantity_accepted: Decimal,
    ) -> Result<goods_receipt_item::Model, ServiceError> {
        let db = &*self.db;
        let item = GoodsReceiptItemEntity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Receipt item {} not found", item_id)))?;

        let receipt = self.get(item.receipt_id).await?;
        if ReceiptStatus::from_str(&receipt.status) == Some(ReceiptStatus::Approved) {
            return Err(ServiceError::invalid_transition(
                receipt.status,
                "amend accepted quantity",
            ));
        }
        if quantity_accepted < Decimal::ZERO || quantity_accepted > item.quantity_received {
            return Err(ServiceError::ValidationError(format!(
                "Accepted quantity must be between 0 and received {} for item {}",
                item.quantity_received, item_id
            )));
        }

        let mut active: goods_receipt_item::ActiveModel = item.into();
        active.quantity_accepted = Set(quantity_accepted);
        active.updated_at = Set(Utc::now());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Verifies a draft receipt: classifies each line's ordered-vs-received
    /// difference and settles the document on verified or discrepancy.
    #[instrument(skip(self))]
    pub async fn verify(
        &self,
        receipt_id: Uuid,
        verified_by: Uuid,
    ) -> Result<goods_receipt_note::Model, ServiceError> {
        let db = &*self.db;
        let receipt = self.get(receipt_id).await?;

        match ReceiptStatus::from_str(&receipt.status) {
            Some(ReceiptStatus::Draft) => {}
            _ => return Err(ServiceError::invalid_transition(receipt.status, "verify")),
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let items = GoodsReceiptItemEntity::find()
            .filter(goods_receipt_item::Column::ReceiptId.eq(receipt_id))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let mut has_discrepancy = false;
        for item in items {
            let discrepancy = item.quantity_ordered - item.quantity_received;
            let classification = DiscrepancyType::classify(discrepancy);
            if classification != DiscrepancyType::Match {
                has_discrepancy = true;
            }

            let mut active: goods_receipt_item::ActiveModel = item.into();
            active.discrepancy_quantity = Set(discrepancy);
            active.discrepancy_type = Set(Some(classification.as_str().to_string()));
            active.updated_at = Set(Utc::now());
            active.update(&txn).await.map_err(ServiceError::db_error)?;
        }

        let new_status = if has_discrepancy {
            ReceiptStatus::Discrepancy
        } else {
            ReceiptStatus::Verified
        };
        let mut active: goods_receipt_note::ActiveModel = receipt.into();
        active.status = Set(new_status.as_str().to_string());
        active.has_discrepancy = Set(has_discrepancy);
        active.verified_at = Set(Some(Utc::now()));
        active.verified_by = Set(Some(verified_by));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::GoodsReceiptVerified {
                    receipt_id,
                    has_discrepancy,
                })
                .await;
        }

        Ok(updated)
    }

    /// Approves a verified receipt, posting every accepted line to the
    /// ledger. Lines with zero accepted quantity touch nothing.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        receipt_id: Uuid,
        approved_by: Uuid,
    ) -> Result<goods_receipt_note::Model, ServiceError> {
        let db = &*self.db;
        let receipt = self.get(receipt_id).await?;

        let status = ReceiptStatus::from_str(&receipt.status).ok_or_else(|| {
            ServiceError::InternalError(format!(
                "Goods receipt {} has unknown status '{}'",
                receipt.id, receipt.status
            ))
        })?;
        if !status.is_approvable() {
            return Err(ServiceError::invalid_transition(receipt.status, "approve"));
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let items = GoodsReceiptItemEntity::find()
            .filter(goods_receipt_item::Column::ReceiptId.eq(receipt_id))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let mut lines_posted = 0usize;
        let mut ledger_events = Vec::new();
        for item in &items {
            if item.quantity_accepted <= Decimal::ZERO {
                continue;
            }

            let po_item = PurchaseOrderItemEntity::find_by_id(item.purchase_order_item_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Purchase order item {} not found",
                        item.purchase_order_item_id
                    ))
                })?;

            let entry =
                stock_ledger::get_or_create(&txn, item.product_id, receipt.warehouse_id).await?;
            let balance_before = entry.quantity;
            let entry = stock_ledger::add_stock(&txn, entry, item.quantity_accepted).await?;

            let movement = movements::record(
                &txn,
                NewMovement {
                    product_id: item.product_id,
                    warehouse_id: receipt.warehouse_id,
                    movement_type: MovementType::In,
                    quantity: item.quantity_accepted,
                    unit_cost: po_item.unit_cost,
                    balance_before,
                    document_type: DOCUMENT_TYPE,
                    document_id: receipt.id,
                    performed_by: Some(approved_by),
                    notes: Some(format!("Goods receipt {}", receipt.receipt_number)),
                },
            )
            .await?;

            ledger_events.push(Event::StockAdded {
                product_id: item.product_id,
                warehouse_id: receipt.warehouse_id,
                quantity: item.quantity_accepted,
                new_on_hand: entry.quantity,
            });
            ledger_events.push(Event::movement_recorded(&movement));

            let received = po_item.quantity_received + item.quantity_accepted;
            let remaining = (po_item.quantity_ordered - received).max(Decimal::ZERO);
            let mut po_active: purchase_order_item::ActiveModel = po_item.into();
            po_active.quantity_received = Set(received);
            po_active.quantity_remaining = Set(remaining);
            po_active.updated_at = Set(Utc::now());
            po_active.update(&txn).await.map_err(ServiceError::db_error)?;

            lines_posted += 1;
        }

        let (old_po_status, new_po_status) =
            purchase_orders::recompute_status(&txn, receipt.purchase_order_id).await?;

        let purchase_order_id = receipt.purchase_order_id;
        let mut active: goods_receipt_note::ActiveModel = receipt.into();
        active.status = Set(ReceiptStatus::Approved.as_str().to_string());
        active.approved_at = Set(Some(Utc::now()));
        active.approved_by = Set(Some(approved_by));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("ledger.goods_receipts.approved", 1);

        if let Some(sender) = &self.event_sender {
            sender.send_all_or_log(ledger_events).await;
            sender
                .send_or_log(Event::GoodsReceiptApproved {
                    receipt_id,
                    purchase_order_id,
                    lines_posted,
                })
                .await;
        }
        self.purchase_orders
            .emit_status_changed(purchase_order_id, &old_po_status, &new_po_status)
            .await;

        info!(
            "Goods receipt approved: {} ({} lines posted)",
            updated.receipt_number, lines_posted
        );
        Ok(updated)
    }

    pub async fn get(&self, receipt_id: Uuid) -> Result<goods_receipt_note::Model, ServiceError> {
        GoodsReceiptNoteEntity::find_by_id(receipt_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Goods receipt {} not found", receipt_id)))
    }

    pub async fn get_items(
        &self,
        receipt_id: Uuid,
    ) -> Result<Vec<goods_receipt_item::Model>, ServiceError> {
        GoodsReceiptItemEntity::find()
            .filter(goods_receipt_item::Column::ReceiptId.eq(receipt_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }
}
