use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Material line state machine:
/// pending -> reserved -> picked -> issued -> consumed | returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialStatus {
    Pending,
    Reserved,
    Picked,
    Issued,
    Consumed,
    Returned,
}

impl MaterialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialStatus::Pending => "pending",
            MaterialStatus::Reserved => "reserved",
            MaterialStatus::Picked => "picked",
            MaterialStatus::Issued => "issued",
            MaterialStatus::Consumed => "consumed",
            MaterialStatus::Returned => "returned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(MaterialStatus::Pending),
            "reserved" => Some(MaterialStatus::Reserved),
            "picked" => Some(MaterialStatus::Picked),
            "issued" => Some(MaterialStatus::Issued),
            "consumed" => Some(MaterialStatus::Consumed),
            "returned" => Some(MaterialStatus::Returned),
            _ => None,
        }
    }
}

/// Material requirement line on a production order.
///
/// `warehouse_id` is chosen at reservation time (warehouse with the most
/// available stock) and is where picking, issuing, and returns happen.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub production_order_id: Uuid,
    pub product_id: Uuid,
    pub status: String,
    pub quantity_required: Decimal,
    pub quantity_reserved: Decimal,
    pub quantity_issued: Decimal,
    pub quantity_consumed: Decimal,
    pub quantity_returned: Decimal,
    pub unit_cost: Decimal,
    pub warehouse_id: Option<Uuid>,
    pub reserved_at: Option<DateTime<Utc>>,
    pub picked_at: Option<DateTime<Utc>>,
    pub picked_by: Option<Uuid>,
    pub issued_at: Option<DateTime<Utc>>,
    pub issued_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Quantity still issued to the shop floor and not yet consumed.
    pub fn outstanding_issued(&self) -> Decimal {
        self.quantity_issued - self.quantity_consumed
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::production_order::Entity",
        from = "Column::ProductionOrderId",
        to = "super::production_order::Column::Id"
    )]
    ProductionOrder,
}

impl Related<super::production_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_status_round_trips() {
        for s in [
            MaterialStatus::Pending,
            MaterialStatus::Reserved,
            MaterialStatus::Picked,
            MaterialStatus::Issued,
            MaterialStatus::Consumed,
            MaterialStatus::Returned,
        ] {
            assert_eq!(MaterialStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(MaterialStatus::from_str("allocated"), None);
    }
}
