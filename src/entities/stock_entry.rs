use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per (product, warehouse) stock balance.
///
/// `available_quantity` is stored, not derived on read; every ledger
/// mutation recomputes it as `quantity - reserved_quantity`. Rows are
/// created lazily and never deleted. `version` backs the optimistic
/// compare-and-swap used by all mutations.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: Decimal,
    pub reserved_quantity: Decimal,
    pub available_quantity: Decimal,
    pub reorder_level: Decimal,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Low-stock classification: positive on-hand at or below reorder level.
    pub fn is_low_stock(&self) -> bool {
        self.quantity > Decimal::ZERO && self.quantity <= self.reorder_level
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(quantity: Decimal, reorder_level: Decimal) -> Model {
        Model {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            quantity,
            reserved_quantity: Decimal::ZERO,
            available_quantity: quantity,
            reorder_level,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_requires_positive_on_hand() {
        assert!(entry(dec!(3), dec!(5)).is_low_stock());
        assert!(!entry(dec!(0), dec!(5)).is_low_stock());
        assert!(!entry(dec!(8), dec!(5)).is_low_stock());
    }
}
