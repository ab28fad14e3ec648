//! Movement log: append-only audit trail of every ledger mutation.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder,
};
use tracing::instrument;
use uuid::Uuid;

use crate::entities::stock_movement::{self, Entity as StockMovementEntity, MovementType};
use crate::errors::ServiceError;
use crate::services::sequences;

const MOVEMENT_PREFIX: &str = "MOV";

/// Input for recording one movement.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub movement_type: MovementType,
    /// Signed quantity: negative for outbound movements
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    /// On-hand balance captured from the ledger entry before the mutation
    pub balance_before: Decimal,
    pub document_type: &'static str,
    pub document_id: Uuid,
    pub performed_by: Option<Uuid>,
    pub notes: Option<String>,
}

fn direction_matches(movement_type: MovementType, quantity: Decimal) -> bool {
    match movement_type {
        MovementType::In | MovementType::TransferIn | MovementType::Return => {
            quantity > Decimal::ZERO
        }
        MovementType::Out | MovementType::TransferOut => quantity < Decimal::ZERO,
        MovementType::Adjustment => quantity != Decimal::ZERO,
    }
}

/// Appends one immutable movement row.
///
/// `balance_after` is computed here, never supplied, so every stored row
/// satisfies `balance_after == balance_before + quantity`. The reference
/// number comes from the sequence service within the caller's transaction.
#[instrument(skip(conn, movement), fields(product_id = %movement.product_id))]
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    movement: NewMovement,
) -> Result<stock_movement::Model, ServiceError> {
    if movement.quantity == Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Movement quantity cannot be zero".to_string(),
        ));
    }
    if !direction_matches(movement.movement_type, movement.quantity) {
        return Err(ServiceError::ValidationError(format!(
            "Movement type {} does not match signed quantity {}",
            movement.movement_type.as_str(),
            movement.quantity
        )));
    }
    if movement.unit_cost < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Unit cost cannot be negative".to_string(),
        ));
    }

    let reference_number = sequences::next_reference(conn, MOVEMENT_PREFIX).await?;
    let now = Utc::now();
    let balance_after = movement.balance_before + movement.quantity;
    let total_cost = movement.quantity.abs() * movement.unit_cost;

    let row = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        reference_number: Set(reference_number),
        product_id: Set(movement.product_id),
        warehouse_id: Set(movement.warehouse_id),
        movement_type: Set(movement.movement_type.as_str().to_string()),
        quantity: Set(movement.quantity),
        unit_cost: Set(movement.unit_cost),
        total_cost: Set(total_cost),
        balance_before: Set(movement.balance_before),
        balance_after: Set(balance_after),
        document_type: Set(movement.document_type.to_string()),
        document_id: Set(movement.document_id),
        performed_by: Set(movement.performed_by),
        notes: Set(movement.notes),
        movement_date: Set(now),
        created_at: Set(now),
    };

    row.insert(conn).await.map_err(ServiceError::db_error)
}

/// Movements for a product at a warehouse, most recent first.
pub async fn history<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<Vec<stock_movement::Model>, ServiceError> {
    StockMovementEntity::find()
        .filter(stock_movement::Column::ProductId.eq(product_id))
        .filter(stock_movement::Column::WarehouseId.eq(warehouse_id))
        .order_by_desc(stock_movement::Column::MovementDate)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// All movements triggered by one document.
pub async fn for_document<C: ConnectionTrait>(
    conn: &C,
    document_type: &str,
    document_id: Uuid,
) -> Result<Vec<stock_movement::Model>, ServiceError> {
    StockMovementEntity::find()
        .filter(stock_movement::Column::DocumentType.eq(document_type))
        .filter(stock_movement::Column::DocumentId.eq(document_id))
        .order_by_desc(stock_movement::Column::MovementDate)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn direction_check_rejects_mismatched_signs() {
        assert!(direction_matches(MovementType::In, dec!(5)));
        assert!(!direction_matches(MovementType::In, dec!(-5)));
        assert!(direction_matches(MovementType::Out, dec!(-5)));
        assert!(!direction_matches(MovementType::Out, dec!(5)));
        assert!(direction_matches(MovementType::Adjustment, dec!(-3)));
        assert!(!direction_matches(MovementType::Adjustment, dec!(0)));
    }
}
