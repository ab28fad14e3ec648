use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::purchase_order::{self, Entity as PurchaseOrderEntity, PurchaseOrderStatus};
use crate::entities::purchase_order_item::{self, Entity as PurchaseOrderItemEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::sequences;

const REFERENCE_PREFIX: &str = "PO";

/// New line on a purchase order being created.
#[derive(Debug, Clone)]
pub struct NewPurchaseOrderLine {
    pub product_id: Uuid,
    pub quantity_ordered: Decimal,
    pub unit_cost: Decimal,
}

/// Service owning the purchase order workflow:
/// draft -> approved -> partially_received -> received, with cancellation
/// from the pre-receipt states. Receipt quantities are posted by the goods
/// receipt service, which calls back into [`recompute_status`].
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a draft purchase order with its line items.
    #[instrument(skip(self, lines))]
    pub async fn create(
        &self,
        supplier_id: Uuid,
        lines: Vec<NewPurchaseOrderLine>,
        notes: Option<String>,
    ) -> Result<purchase_order::Model, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "Purchase order needs at least one line".to_string(),
            ));
        }
        for line in &lines {
            if line.quantity_ordered <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Ordered quantity must be positive for product {}",
                    line.product_id
                )));
            }
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let order_number = sequences::next_reference(&txn, REFERENCE_PREFIX).await?;
        let now = Utc::now();
        let order = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number.clone()),
            supplier_id: Set(supplier_id),
            status: Set(PurchaseOrderStatus::Draft.as_str().to_string()),
            order_date: Set(now),
            approved_at: Set(None),
            approved_by: Set(None),
            cancelled_at: Set(None),
            notes: Set(notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = order.insert(&txn).await.map_err(ServiceError::db_error)?;

        for line in lines {
            let item = purchase_order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_order_id: Set(created.id),
                product_id: Set(line.product_id),
                quantity_ordered: Set(line.quantity_ordered),
                quantity_received: Set(Decimal::ZERO),
                quantity_remaining: Set(line.quantity_ordered),
                unit_cost: Set(line.unit_cost),
                created_at: Set(now),
                updated_at: Set(now),
            };
            item.insert(&txn).await.map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!("Purchase order created: {}", order_number);
        Ok(created)
    }

    /// Approves a draft purchase order.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        order_id: Uuid,
        approved_by: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db;
        let order = self.get(order_id).await?;

        match PurchaseOrderStatus::from_str(&order.status) {
            Some(PurchaseOrderStatus::Draft) => {}
            _ => return Err(ServiceError::invalid_transition(order.status, "approve")),
        }

        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(PurchaseOrderStatus::Approved.as_str().to_string());
        active.approved_at = Set(Some(Utc::now()));
        active.approved_by = Set(Some(approved_by));
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!("Purchase order approved: {}", updated.order_number);
        Ok(updated)
    }

    /// Cancels an order that has not received any goods yet.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db;
        let order = self.get(order_id).await?;

        match PurchaseOrderStatus::from_str(&order.status) {
            Some(PurchaseOrderStatus::Draft) | Some(PurchaseOrderStatus::Approved) => {}
            _ => return Err(ServiceError::invalid_transition(order.status, "cancel")),
        }

        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(PurchaseOrderStatus::Cancelled.as_str().to_string());
        active.cancelled_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());

        active.update(db).await.map_err(ServiceError::db_error)
    }

    pub async fn get(&self, order_id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        PurchaseOrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", order_id)))
    }

    pub async fn get_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<purchase_order_item::Model>, ServiceError> {
        PurchaseOrderItemEntity::find()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(order_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Emits a status-changed event if the recompute moved the order.
    pub(crate) async fn emit_status_changed(&self, order_id: Uuid, old: &str, new: &str) {
        if old == new {
            return;
        }
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::PurchaseOrderStatusChanged {
                    purchase_order_id: order_id,
                    old_status: old.to_string(),
                    new_status: new.to_string(),
                })
                .await;
        }
    }
}

/// Recomputes a purchase order's receipt status from its line items.
///
/// Runs inside the caller's transaction (goods receipt approval). Returns
/// (old_status, new_status).
pub async fn recompute_status<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<(String, String), ServiceError> {
    let order = PurchaseOrderEntity::find_by_id(order_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", order_id)))?;

    let items = PurchaseOrderItemEntity::find()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(order_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let new_status = if items.iter().all(|i| i.is_fully_received()) {
        PurchaseOrderStatus::Received
    } else {
        PurchaseOrderStatus::PartiallyReceived
    };

    let old_status = order.status.clone();
    if old_status != new_status.as_str() {
        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(new_status.as_str().to_string());
        active.updated_at = Set(Utc::now());
        active.update(conn).await.map_err(ServiceError::db_error)?;
    }

    Ok((old_status, new_status.as_str().to_string()))
}
