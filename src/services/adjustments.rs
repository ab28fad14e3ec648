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

use crate::entities::stock_adjustment::{self, AdjustmentStatus, Entity as StockAdjustmentEntity};
use crate::entities::stock_adjustment_item::{self, Entity as StockAdjustmentItemEntity};
use crate::entities::stock_movement::MovementType;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::movements::NewMovement;
use crate::services::{movements, sequences, stock_ledger};

const REFERENCE_PREFIX: &str = "ADJ";
pub const DOCUMENT_TYPE: &str = "stock_adjustment";

/// A physical count reported for one product.
#[derive(Debug, Clone)]
pub struct NewAdjustmentLine {
    pub product_id: Uuid,
    pub counted_quantity: Decimal,
}

/// Stock adjustment workflow: draft -> approved.
///
/// Creation snapshots the system quantity per line; approval applies the
/// signed counted-minus-system delta to the ledger with an adjustment
/// movement per changed line. Lines whose count matches the system are
/// skipped.
#[derive(Clone)]
pub struct AdjustmentService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl AdjustmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, lines))]
    pub async fn create(
        &self,
        warehouse_id: Uuid,
        lines: Vec<NewAdjustmentLine>,
        reason: Option<String>,
    ) -> Result<stock_adjustment::Model, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "Adjustment needs at least one line".to_string(),
            ));
        }
        for line in &lines {
            if line.counted_quantity < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Counted quantity cannot be negative for product {}",
                    line.product_id
                )));
            }
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let adjustment_number = sequences::next_reference(&txn, REFERENCE_PREFIX).await?;
        let now = Utc::now();
        let adjustment = stock_adjustment::ActiveModel {
            id: Set(Uuid::new_v4()),
            adjustment_number: Set(adjustment_number.clone()),
            warehouse_id: Set(warehouse_id),
            status: Set(AdjustmentStatus::Draft.as_str().to_string()),
            reason: Set(reason),
            approved_at: Set(None),
            approved_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = adjustment
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        for line in lines {
            // Snapshot what the ledger believes right now; the delta applied
            // at approval is relative to this figure.
            let system_quantity = stock_ledger::get_entry(&txn, line.product_id, warehouse_id)
                .await?
                .map(|e| e.quantity)
                .unwrap_or(Decimal::ZERO);

            let item = stock_adjustment_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                adjustment_id: Set(created.id),
                product_id: Set(line.product_id),
                system_quantity: Set(system_quantity),
                counted_quantity: Set(line.counted_quantity),
                created_at: Set(now),
                updated_at: Set(now),
            };
            item.insert(&txn).await.map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!("Stock adjustment created: {}", adjustment_number);
        Ok(created)
    }

    /// Approves a draft adjustment, applying each nonzero delta to the
    /// ledger within one transaction.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        adjustment_id: Uuid,
        approved_by: Uuid,
    ) -> Result<stock_adjustment::Model, ServiceError> {
        let db = &*self.db;
        let adjustment = self.get(adjustment_id).await?;

        match AdjustmentStatus::from_str(&adjustment.status) {
            Some(AdjustmentStatus::Draft) => {}
            _ => {
                return Err(ServiceError::invalid_transition(
                    adjustment.status,
                    "approve",
                ))
            }
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let items = StockAdjustmentItemEntity::find()
            .filter(stock_adjustment_item::Column::AdjustmentId.eq(adjustment_id))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let mut lines_posted = 0usize;
        let mut ledger_events = Vec::new();
        for item in &items {
            let delta = item.delta();
            if delta == Decimal::ZERO {
                continue;
            }

            let entry =
                stock_ledger::get_or_create(&txn, item.product_id, adjustment.warehouse_id)
                    .await?;
            let balance_before = entry.quantity;
            let entry = if delta > Decimal::ZERO {
                stock_ledger::add_stock(&txn, entry, delta).await?
            } else {
                stock_ledger::remove_stock(&txn, entry, -delta).await?
            };

            let movement = movements::record(
                &txn,
                NewMovement {
                    product_id: item.product_id,
                    warehouse_id: adjustment.warehouse_id,
                    movement_type: MovementType::Adjustment,
                    quantity: delta,
                    unit_cost: Decimal::ZERO,
                    balance_before,
                    document_type: DOCUMENT_TYPE,
                    document_id: adjustment.id,
                    performed_by: Some(approved_by),
                    notes: adjustment.reason.clone(),
                },
            )
            .await?;

            if delta > Decimal::ZERO {
                ledger_events.push(Event::StockAdded {
                    product_id: item.product_id,
                    warehouse_id: adjustment.warehouse_id,
                    quantity: delta,
                    new_on_hand: entry.quantity,
                });
            } else {
                ledger_events.push(Event::StockRemoved {
                    product_id: item.product_id,
                    warehouse_id: adjustment.warehouse_id,
                    quantity: -delta,
                    new_on_hand: entry.quantity,
                });
                if entry.is_low_stock() {
                    ledger_events.push(Event::low_stock(&entry));
                }
            }
            ledger_events.push(Event::movement_recorded(&movement));

            lines_posted += 1;
        }

        let mut active: stock_adjustment::ActiveModel = adjustment.into();
        active.status = Set(AdjustmentStatus::Approved.as_str().to_string());
        active.approved_at = Set(Some(Utc::now()));
        active.approved_by = Set(Some(approved_by));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("ledger.adjustments.approved", 1);

        if let Some(sender) = &self.event_sender {
            sender.send_all_or_log(ledger_events).await;
            sender
                .send_or_log(Event::AdjustmentApproved {
                    adjustment_id,
                    lines_posted,
                })
                .await;
        }

        info!(
            "Stock adjustment approved: {} ({} lines posted)",
            updated.adjustment_number, lines_posted
        );
        Ok(updated)
    }

    pub async fn get(
        &self,
        adjustment_id: Uuid,
    ) -> Result<stock_adjustment::Model, ServiceError> {
        StockAdjustmentEntity::find_by_id(adjustment_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Adjustment {} not found", adjustment_id))
            })
    }

    pub async fn get_items(
        &self,
        adjustment_id: Uuid,
    ) -> Result<Vec<stock_adjustment_item::Model>, ServiceError> {
        StockAdjustmentItemEntity::find()
            .filter(stock_adjustment_item::Column::AdjustmentId.eq(adjustment_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }
}
