use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::production_order::{
    self, Entity as ProductionOrderEntity, ProductionOrderStatus,
};
use crate::entities::production_order_item::{
    self, Entity as ProductionOrderItemEntity, MaterialStatus,
};
use crate::entities::stock_entry;
use crate::entities::stock_movement::MovementType;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::movements::NewMovement;
use crate::services::{movements, sequences, stock_ledger};

const REFERENCE_PREFIX: &str = "PRD";
pub const DOCUMENT_TYPE: &str = "production_order";

/// Material requirement declared when creating a production order.
#[derive(Debug, Clone)]
pub struct NewMaterialLine {
    pub product_id: Uuid,
    pub quantity_required: Decimal,
    pub unit_cost: Decimal,
}

/// Production order service owning the material reservation protocol.
///
/// Per material line: pending -> reserved -> picked -> issued ->
/// consumed | returned. Reservation is all-or-nothing per order: one short
/// line aborts the transaction and every earlier reservation rolls back.
/// Issuance and returns go through the narrow ledger API (release +
/// remove_stock, add_stock) so the ledger invariant is enforced in one
/// place.
#[derive(Clone)]
pub struct ProductionOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl ProductionOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, materials))]
    pub async fn create(
        &self,
        product_id: Uuid,
        quantity: Decimal,
        materials: Vec<NewMaterialLine>,
        notes: Option<String>,
    ) -> Result<production_order::Model, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Production quantity must be positive".to_string(),
            ));
        }
        if materials.is_empty() {
            return Err(ServiceError::ValidationError(
                "Production order needs at least one material line".to_string(),
            ));
        }
        for line in &materials {
            if line.quantity_required <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Required quantity must be positive for material {}",
                    line.product_id
                )));
            }
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let order_number = sequences::next_reference(&txn, REFERENCE_PREFIX).await?;
        let now = Utc::now();
        let order = production_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number.clone()),
            product_id: Set(product_id),
            quantity: Set(quantity),
            status: Set(ProductionOrderStatus::Draft.as_str().to_string()),
            released_at: Set(None),
            completed_at: Set(None),
            notes: Set(notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = order.insert(&txn).await.map_err(ServiceError::db_error)?;

        for line in materials {
            let item = production_order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                production_order_id: Set(created.id),
                product_id: Set(line.product_id),
                status: Set(MaterialStatus::Pending.as_str().to_string()),
                quantity_required: Set(line.quantity_required),
                quantity_reserved: Set(Decimal::ZERO),
                quantity_issued: Set(Decimal::ZERO),
                quantity_consumed: Set(Decimal::ZERO),
                quantity_returned: Set(Decimal::ZERO),
                unit_cost: Set(line.unit_cost),
                warehouse_id: Set(None),
                reserved_at: Set(None),
                picked_at: Set(None),
                picked_by: Set(None),
                issued_at: Set(None),
                issued_by: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            item.insert(&txn).await.map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!("Production order created: {}", order_number);
        Ok(created)
    }

    /// Reserves stock for every pending material line, all-or-nothing.
    ///
    /// Each line picks the warehouse with the most available stock. If any
    /// line cannot be covered the transaction rolls back, leaving every
    /// line pending and the ledger untouched, and a shortage event is
    /// emitted for the line that failed.
    #[instrument(skip(self))]
    pub async fn reserve_materials(
        &self,
        order_id: Uuid,
    ) -> Result<production_order::Model, ServiceError> {
        let db = &*self.db;
        let order = self.get(order_id).await?;

        match ProductionOrderStatus::from_str(&order.status) {
            Some(ProductionOrderStatus::Draft) => {}
            _ => {
                return Err(ServiceError::invalid_transition(
                    order.status,
                    "reserve materials",
                ))
            }
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let items = items_in(&txn, order_id).await?;

        let mut item_count = 0usize;
        let mut ledger_events = Vec::new();
        for item in &items {
            if MaterialStatus::from_str(&item.status) != Some(MaterialStatus::Pending) {
                continue;
            }

            let entry =
                stock_ledger::find_best_warehouse(&txn, item.product_id, item.quantity_required)
                    .await?;
            let entry = match entry {
                Some(entry) => entry,
                None => {
                    txn.rollback().await.map_err(ServiceError::db_error)?;
                    if let Some(sender) = &self.event_sender {
                        sender
                            .send_or_log(Event::MaterialShortageDetected {
                                production_order_id: order_id,
                                product_id: item.product_id,
                                required_quantity: item.quantity_required,
                            })
                            .await;
                    }
                    return Err(ServiceError::InsufficientStock(format!(
                        "No warehouse holds {} of product {}",
                        item.quantity_required, item.product_id
                    )));
                }
            };

            let warehouse_id = entry.warehouse_id;
            let entry = stock_ledger::reserve(&txn, entry, item.quantity_required).await?;
            ledger_events.push(Event::StockReserved {
                product_id: item.product_id,
                warehouse_id,
                quantity: item.quantity_required,
                available_after: entry.available_quantity,
            });

            let mut active: production_order_item::ActiveModel = item.clone().into();
            active.status = Set(MaterialStatus::Reserved.as_str().to_string());
            active.quantity_reserved = Set(item.quantity_required);
            active.warehouse_id = Set(Some(warehouse_id));
            active.reserved_at = Set(Some(Utc::now()));
            active.updated_at = Set(Utc::now());
            active.update(&txn).await.map_err(ServiceError::db_error)?;

            item_count += 1;
        }

        let mut active: production_order::ActiveModel = order.into();
        active.status = Set(ProductionOrderStatus::Released.as_str().to_string());
        active.released_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("ledger.production.materials_reserved", 1);

        if let Some(sender) = &self.event_sender {
            sender.send_all_or_log(ledger_events).await;
            sender
                .send_or_log(Event::MaterialsReserved {
                    production_order_id: order_id,
                    item_count,
                })
                .await;
        }

        info!(
            "Materials reserved for production order {} ({} lines)",
            updated.order_number, item_count
        );
        Ok(updated)
    }

    /// Releases every reserved line back to pending and returns the order
    /// to draft. Valid only before any line has been picked or issued.
    #[instrument(skip(self))]
    pub async fn unreserve_materials(
        &self,
        order_id: Uuid,
    ) -> Result<production_order::Model, ServiceError> {
        let db = &*self.db;
        let order = self.get(order_id).await?;

        match ProductionOrderStatus::from_str(&order.status) {
            Some(ProductionOrderStatus::Released) => {}
            _ => {
                return Err(ServiceError::invalid_transition(
                    order.status,
                    "unreserve materials",
                ))
            }
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let items = items_in(&txn, order_id).await?;

        let mut ledger_events = Vec::new();
        for item in &items {
            match MaterialStatus::from_str(&item.status) {
                Some(MaterialStatus::Reserved) => {}
                Some(MaterialStatus::Pending) => continue,
                _ => {
                    return Err(ServiceError::invalid_transition(
                        item.status.clone(),
                        "unreserve",
                    ))
                }
            }
            let entry = unreserve_line(&txn, item).await?;
            ledger_events.push(Event::StockReleased {
                product_id: item.product_id,
                warehouse_id: entry.warehouse_id,
                quantity: item.quantity_reserved,
                available_after: entry.available_quantity,
            });
        }

        let mut active: production_order::ActiveModel = order.into();
        active.status = Set(ProductionOrderStatus::Draft.as_str().to_string());
        active.released_at = Set(None);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender.send_all_or_log(ledger_events).await;
        }

        info!(
            "Materials unreserved for production order {}",
            updated.order_number
        );
        Ok(updated)
    }

    /// Marks a reserved line as picked. No ledger effect.
    #[instrument(skip(self))]
    pub async fn pick(
        &self,
        item_id: Uuid,
        picked_by: Uuid,
    ) -> Result<production_order_item::Model, ServiceError> {
        let db = &*self.db;
        let item = self.get_item(item_id).await?;

        match MaterialStatus::from_str(&item.status) {
            Some(MaterialStatus::Reserved) => {}
            _ => return Err(ServiceError::invalid_transition(item.status, "pick")),
        }

        let mut active: production_order_item::ActiveModel = item.into();
        active.status = Set(MaterialStatus::Picked.as_str().to_string());
        active.picked_at = Set(Some(Utc::now()));
        active.picked_by = Set(Some(picked_by));
        active.updated_at = Set(Utc::now());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Issues a picked line to the shop floor: releases the reservation,
    /// removes the stock, and records an outbound movement, all within one
    /// transaction.
    #[instrument(skip(self))]
    pub async fn issue(
        &self,
        item_id: Uuid,
        issued_by: Uuid,
    ) -> Result<production_order_item::Model, ServiceError> {
        let db = &*self.db;
        let item = self.get_item(item_id).await?;

        match MaterialStatus::from_str(&item.status) {
            Some(MaterialStatus::Picked) => {}
            _ => return Err(ServiceError::invalid_transition(item.status, "issue")),
        }

        let order = self.get(item.production_order_id).await?;
        let warehouse_id = item.warehouse_id.ok_or_else(|| {
            ServiceError::InternalError(format!("Picked item {} has no warehouse", item.id))
        })?;

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let entry = stock_ledger::get_entry(&txn, item.product_id, warehouse_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No stock entry for product {} at warehouse {}",
                    item.product_id, warehouse_id
                ))
            })?;

        let qty = item.quantity_reserved;
        let balance_before = entry.quantity;
        let entry = stock_ledger::release(&txn, entry, qty).await?;
        let entry = stock_ledger::remove_stock(&txn, entry, qty).await?;

        let movement = movements::record(
            &txn,
            NewMovement {
                product_id: item.product_id,
                warehouse_id,
                movement_type: MovementType::Out,
                quantity: -qty,
                unit_cost: item.unit_cost,
                balance_before,
                document_type: DOCUMENT_TYPE,
                document_id: item.production_order_id,
                performed_by: Some(issued_by),
                notes: Some(format!("Issued to production order {}", order.order_number)),
            },
        )
        .await?;

        let mut ledger_events = vec![
            Event::StockRemoved {
                product_id: item.product_id,
                warehouse_id,
                quantity: qty,
                new_on_hand: entry.quantity,
            },
            Event::movement_recorded(&movement),
        ];
        if entry.is_low_stock() {
            ledger_events.push(Event::low_stock(&entry));
        }

        let production_order_id = item.production_order_id;
        let mut active: production_order_item::ActiveModel = item.into();
        active.status = Set(MaterialStatus::Issued.as_str().to_string());
        active.quantity_issued = Set(qty);
        active.issued_at = Set(Some(Utc::now()));
        active.issued_by = Set(Some(issued_by));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        if ProductionOrderStatus::from_str(&order.status) == Some(ProductionOrderStatus::Released) {
            let mut order_active: production_order::ActiveModel = order.into();
            order_active.status = Set(ProductionOrderStatus::InProgress.as_str().to_string());
            order_active.updated_at = Set(Utc::now());
            order_active
                .update(&txn)
                .await
                .map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("ledger.production.materials_issued", 1);

        if let Some(sender) = &self.event_sender {
            sender.send_all_or_log(ledger_events).await;
            sender
                .send_or_log(Event::MaterialIssued {
                    production_order_id,
                    item_id,
                    quantity: qty,
                })
                .await;
        }

        Ok(updated)
    }

    /// Records consumption of issued material. The line flips to consumed
    /// once the full issued quantity is used up; the order completes when
    /// every line is consumed or returned.
    #[instrument(skip(self))]
    pub async fn consume(
        &self,
        item_id: Uuid,
        qty: Decimal,
    ) -> Result<production_order_item::Model, ServiceError> {
        let db = &*self.db;
        let item = self.get_item(item_id).await?;

        match MaterialStatus::from_str(&item.status) {
            Some(MaterialStatus::Issued) => {}
            _ => return Err(ServiceError::invalid_transition(item.status, "consume")),
        }
        if qty <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Consumed quantity must be positive".to_string(),
            ));
        }
        if qty > item.outstanding_issued() {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot consume {}: only {} issued and unconsumed",
                qty,
                item.outstanding_issued()
            )));
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let consumed = item.quantity_consumed + qty;
        let fully_consumed = consumed >= item.quantity_issued;
        let production_order_id = item.production_order_id;

        let mut active: production_order_item::ActiveModel = item.into();
        active.quantity_consumed = Set(consumed);
        if fully_consumed {
            active.status = Set(MaterialStatus::Consumed.as_str().to_string());
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        let completed = maybe_complete(&txn, production_order_id).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let (Some(completed_at), Some(sender)) = (completed, &self.event_sender) {
            sender
                .send_or_log(Event::ProductionOrderCompleted {
                    production_order_id,
                    completed_at,
                })
                .await;
        }

        Ok(updated)
    }

    /// Returns unconsumed issued material to stock at the warehouse it was
    /// issued from.
    #[instrument(skip(self))]
    pub async fn return_material(
        &self,
        item_id: Uuid,
        qty: Decimal,
        performed_by: Uuid,
    ) -> Result<production_order_item::Model, ServiceError> {
        let db = &*self.db;
        let item = self.get_item(item_id).await?;

        match MaterialStatus::from_str(&item.status) {
            Some(MaterialStatus::Issued) => {}
            _ => {
                return Err(ServiceError::invalid_transition(
                    item.status,
                    "return material",
                ))
            }
        }
        if qty <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Returned quantity must be positive".to_string(),
            ));
        }
        if qty > item.outstanding_issued() {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot return {}: only {} issued and unconsumed",
                qty,
                item.outstanding_issued()
            )));
        }

        let warehouse_id = item.warehouse_id.ok_or_else(|| {
            ServiceError::InternalError(format!("Issued item {} has no warehouse", item.id))
        })?;

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let entry = stock_ledger::get_or_create(&txn, item.product_id, warehouse_id).await?;
        let balance_before = entry.quantity;
        let entry = stock_ledger::add_stock(&txn, entry, qty).await?;

        let movement = movements::record(
            &txn,
            NewMovement {
                product_id: item.product_id,
                warehouse_id,
                movement_type: MovementType::Return,
                quantity: qty,
                unit_cost: item.unit_cost,
                balance_before,
                document_type: DOCUMENT_TYPE,
                document_id: item.production_order_id,
                performed_by: Some(performed_by),
                notes: None,
            },
        )
        .await?;

        let ledger_events = vec![
            Event::StockAdded {
                product_id: item.product_id,
                warehouse_id,
                quantity: qty,
                new_on_hand: entry.quantity,
            },
            Event::movement_recorded(&movement),
        ];

        let production_order_id = item.production_order_id;
        let returned = item.quantity_returned + qty;

        let mut active: production_order_item::ActiveModel = item.into();
        active.quantity_returned = Set(returned);
        active.status = Set(MaterialStatus::Returned.as_str().to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        let completed = maybe_complete(&txn, production_order_id).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        if let Some(sender) = &self.event_sender {
            sender.send_all_or_log(ledger_events).await;
            sender
                .send_or_log(Event::MaterialReturned {
                    production_order_id,
                    item_id,
                    quantity: qty,
                })
                .await;
        }
        if let (Some(completed_at), Some(sender)) = (completed, &self.event_sender) {
            sender
                .send_or_log(Event::ProductionOrderCompleted {
                    production_order_id,
                    completed_at,
                })
                .await;
        }

        Ok(updated)
    }

    pub async fn get(&self, order_id: Uuid) -> Result<production_order::Model, ServiceError> {
        ProductionOrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production order {} not found", order_id))
            })
    }

    pub async fn get_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<production_order_item::Model>, ServiceError> {
        items_in(&*self.db, order_id).await
    }

    pub async fn get_item(
        &self,
        item_id: Uuid,
    ) -> Result<production_order_item::Model, ServiceError> {
        ProductionOrderItemEntity::find_by_id(item_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Material line {} not found", item_id)))
    }
}

async fn items_in<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<Vec<production_order_item::Model>, ServiceError> {
    ProductionOrderItemEntity::find()
        .filter(production_order_item::Column::ProductionOrderId.eq(order_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

async fn unreserve_line<C: ConnectionTrait>(
    conn: &C,
    item: &production_order_item::Model,
) -> Result<stock_entry::Model, ServiceError> {
    let warehouse_id = item.warehouse_id.ok_or_else(|| {
        ServiceError::InternalError(format!("Reserved item {} has no warehouse", item.id))
    })?;
    let entry = stock_ledger::get_entry(conn, item.product_id, warehouse_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No stock entry for product {} at warehouse {}",
                item.product_id, warehouse_id
            ))
        })?;
    let entry = stock_ledger::release(conn, entry, item.quantity_reserved).await?;

    let mut active: production_order_item::ActiveModel = item.clone().into();
    active.status = Set(MaterialStatus::Pending.as_str().to_string());
    active.quantity_reserved = Set(Decimal::ZERO);
    active.warehouse_id = Set(None);
    active.reserved_at = Set(None);
    active.updated_at = Set(Utc::now());
    active.update(conn).await.map_err(ServiceError::db_error)?;
    Ok(entry)
}

/// Completes the order once every material line is consumed or returned.
async fn maybe_complete<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<Option<chrono::DateTime<Utc>>, ServiceError> {
    let items = items_in(conn, order_id).await?;
    let all_done = !items.is_empty()
        && items.iter().all(|i| {
            matches!(
                MaterialStatus::from_str(&i.status),
                Some(MaterialStatus::Consumed) | Some(MaterialStatus::Returned)
            )
        });
    if !all_done {
        return Ok(None);
    }

    let order = ProductionOrderEntity::find_by_id(order_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Production order {} not found", order_id)))?;

    match ProductionOrderStatus::from_str(&order.status) {
        Some(ProductionOrderStatus::InProgress) | Some(ProductionOrderStatus::Released) => {}
        _ => return Ok(None),
    }

    let completed_at = Utc::now();
    let mut active: production_order::ActiveModel = order.into();
    active.status = Set(ProductionOrderStatus::Completed.as_str().to_string());
    active.completed_at = Set(Some(completed_at));
    active.updated_at = Set(completed_at);
    active.update(conn).await.map_err(ServiceError::db_error)?;

    Ok(Some(completed_at))
}
