//! Stock ledger: the single source of truth for on-hand, reserved, and
//! available quantities per (product, warehouse).
//!
//! Every function is generic over [`ConnectionTrait`], so the caller decides
//! the transaction scope: document services pass their open transaction and
//! get all-or-nothing semantics for free; tests pass a plain connection.
//!
//! Mutations are optimistic compare-and-swap updates guarded by the row's
//! `version` column. A writer that loses the race gets
//! [`ServiceError::ConcurrentModification`] and its enclosing transaction
//! rolls back.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::stock_entry::{self, Entity as StockEntryEntity};
use crate::errors::ServiceError;

/// Fetches the ledger entry for a (product, warehouse) pair, if any.
pub async fn get_entry<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<Option<stock_entry::Model>, ServiceError> {
    StockEntryEntity::find()
        .filter(stock_entry::Column::ProductId.eq(product_id))
        .filter(stock_entry::Column::WarehouseId.eq(warehouse_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Returns the existing entry or creates one with zero quantities.
///
/// Concurrent creators are arbitrated by the unique (product, warehouse)
/// index. On a plain connection the loser's insert fails and it adopts the
/// winner's row. Inside a Postgres transaction the unique violation aborts
/// the transaction, so the re-fetch fails as well and the caller's whole
/// document action rolls back; the caller retries.
#[instrument(skip(conn))]
pub async fn get_or_create<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<stock_entry::Model, ServiceError> {
    if let Some(existing) = get_entry(conn, product_id, warehouse_id).await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let fresh = stock_entry::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        warehouse_id: Set(warehouse_id),
        quantity: Set(Decimal::ZERO),
        reserved_quantity: Set(Decimal::ZERO),
        available_quantity: Set(Decimal::ZERO),
        reorder_level: Set(Decimal::ZERO),
        version: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match fresh.insert(conn).await {
        Ok(created) => {
            info!(
                product_id = %product_id,
                warehouse_id = %warehouse_id,
                "Created stock entry"
            );
            Ok(created)
        }
        Err(insert_err) => match get_entry(conn, product_id, warehouse_id).await? {
            Some(existing) => Ok(existing),
            None => Err(insert_err.into()),
        },
    }
}

/// Writes new quantity figures with a version-guarded update and returns the
/// updated row. `available_quantity` is always recomputed here, never passed
/// in, so the invariant `available == quantity - reserved` cannot drift.
async fn apply<C: ConnectionTrait>(
    conn: &C,
    entry: stock_entry::Model,
    quantity: Decimal,
    reserved_quantity: Decimal,
) -> Result<stock_entry::Model, ServiceError> {
    let available_quantity = quantity - reserved_quantity;
    let now = Utc::now();

    let result = StockEntryEntity::update_many()
        .col_expr(stock_entry::Column::Quantity, Expr::value(quantity))
        .col_expr(
            stock_entry::Column::ReservedQuantity,
            Expr::value(reserved_quantity),
        )
        .col_expr(
            stock_entry::Column::AvailableQuantity,
            Expr::value(available_quantity),
        )
        .col_expr(stock_entry::Column::Version, Expr::value(entry.version + 1))
        .col_expr(stock_entry::Column::UpdatedAt, Expr::value(now))
        .filter(stock_entry::Column::Id.eq(entry.id))
        .filter(stock_entry::Column::Version.eq(entry.version))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(entry.id));
    }

    Ok(stock_entry::Model {
        quantity,
        reserved_quantity,
        available_quantity,
        version: entry.version + 1,
        updated_at: now,
        ..entry
    })
}

/// Increases on-hand quantity. `qty` must be positive.
#[instrument(skip(conn, entry), fields(entry_id = %entry.id))]
pub async fn add_stock<C: ConnectionTrait>(
    conn: &C,
    entry: stock_entry::Model,
    qty: Decimal,
) -> Result<stock_entry::Model, ServiceError> {
    if qty <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "Stock addition must be positive, got {}",
            qty
        )));
    }
    let quantity = entry.quantity + qty;
    let reserved = entry.reserved_quantity;
    apply(conn, entry, quantity, reserved).await
}

/// Decreases on-hand quantity. Draws below zero are rejected rather than
/// producing negative on-hand.
#[instrument(skip(conn, entry), fields(entry_id = %entry.id))]
pub async fn remove_stock<C: ConnectionTrait>(
    conn: &C,
    entry: stock_entry::Model,
    qty: Decimal,
) -> Result<stock_entry::Model, ServiceError> {
    if qty <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "Stock removal must be positive, got {}",
            qty
        )));
    }
    if qty > entry.quantity {
        return Err(ServiceError::InsufficientStock(format!(
            "Cannot remove {} from entry {}: only {} on hand",
            qty, entry.id, entry.quantity
        )));
    }
    let quantity = entry.quantity - qty;
    let reserved = entry.reserved_quantity;
    apply(conn, entry, quantity, reserved).await
}

/// Earmarks stock for a pending document. Fails without mutation when the
/// available quantity is short.
#[instrument(skip(conn, entry), fields(entry_id = %entry.id))]
pub async fn reserve<C: ConnectionTrait>(
    conn: &C,
    entry: stock_entry::Model,
    qty: Decimal,
) -> Result<stock_entry::Model, ServiceError> {
    if qty <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "Reservation must be positive, got {}",
            qty
        )));
    }
    if qty > entry.available_quantity {
        return Err(ServiceError::InsufficientStock(format!(
            "Cannot reserve {} of product {} at warehouse {}: only {} available",
            qty, entry.product_id, entry.warehouse_id, entry.available_quantity
        )));
    }
    let quantity = entry.quantity;
    let reserved = entry.reserved_quantity + qty;
    apply(conn, entry, quantity, reserved).await
}

/// Returns earmarked stock to the available pool. Releasing more than is
/// reserved is rejected rather than producing a negative reservation.
#[instrument(skip(conn, entry), fields(entry_id = %entry.id))]
pub async fn release<C: ConnectionTrait>(
    conn: &C,
    entry: stock_entry::Model,
    qty: Decimal,
) -> Result<stock_entry::Model, ServiceError> {
    if qty <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "Release must be positive, got {}",
            qty
        )));
    }
    if qty > entry.reserved_quantity {
        return Err(ServiceError::InvalidOperation(format!(
            "Cannot release {} from entry {}: only {} reserved",
            qty, entry.id, entry.reserved_quantity
        )));
    }
    let quantity = entry.quantity;
    let reserved = entry.reserved_quantity - qty;
    apply(conn, entry, quantity, reserved).await
}

/// Sets the reorder level used for low-stock classification.
pub async fn set_reorder_level<C: ConnectionTrait>(
    conn: &C,
    entry: stock_entry::Model,
    reorder_level: Decimal,
) -> Result<stock_entry::Model, ServiceError> {
    if reorder_level < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Reorder level cannot be negative".to_string(),
        ));
    }
    let now = Utc::now();
    let result = StockEntryEntity::update_many()
        .col_expr(
            stock_entry::Column::ReorderLevel,
            Expr::value(reorder_level),
        )
        .col_expr(stock_entry::Column::Version, Expr::value(entry.version + 1))
        .col_expr(stock_entry::Column::UpdatedAt, Expr::value(now))
        .filter(stock_entry::Column::Id.eq(entry.id))
        .filter(stock_entry::Column::Version.eq(entry.version))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;
    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(entry.id));
    }
    Ok(stock_entry::Model {
        reorder_level,
        version: entry.version + 1,
        updated_at: now,
        ..entry
    })
}

/// Total on-hand quantity for a product across all warehouses.
pub async fn total_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<Decimal, ServiceError> {
    let entries = StockEntryEntity::find()
        .filter(stock_entry::Column::ProductId.eq(product_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(entries.iter().map(|e| e.quantity).sum())
}

/// Entries in a warehouse with positive on-hand at or below reorder level.
pub async fn low_stock<C: ConnectionTrait>(
    conn: &C,
    warehouse_id: Uuid,
) -> Result<Vec<stock_entry::Model>, ServiceError> {
    let entries = StockEntryEntity::find()
        .filter(stock_entry::Column::WarehouseId.eq(warehouse_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(entries.into_iter().filter(|e| e.is_low_stock()).collect())
}

/// Picks the warehouse holding the most available stock for a product.
///
/// Deliberate business policy carried over from the original workflow:
/// highest available wins, not nearest and not FIFO.
pub async fn find_best_warehouse<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    required: Decimal,
) -> Result<Option<stock_entry::Model>, ServiceError> {
    let best = StockEntryEntity::find()
        .filter(stock_entry::Column::ProductId.eq(product_id))
        .order_by_desc(stock_entry::Column::AvailableQuantity)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(best.filter(|entry| entry.available_quantity >= required))
}
