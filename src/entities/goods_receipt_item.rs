use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of the ordered-vs-received difference on a receipt line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscrepancyType {
    Shortage,
    Overage,
    Match,
}

impl DiscrepancyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyType::Shortage => "shortage",
            DiscrepancyType::Overage => "overage",
            DiscrepancyType::Match => "match",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "shortage" => Some(DiscrepancyType::Shortage),
            "overage" => Some(DiscrepancyType::Overage),
            "match" => Some(DiscrepancyType::Match),
            _ => None,
        }
    }

    /// Classifies `ordered - received`.
    pub fn classify(discrepancy: Decimal) -> Self {
        if discrepancy > Decimal::ZERO {
            DiscrepancyType::Shortage
        } else if discrepancy < Decimal::ZERO {
            DiscrepancyType::Overage
        } else {
            DiscrepancyType::Match
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goods_receipt_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub receipt_id: Uuid,
    pub purchase_order_item_id: Uuid,
    pub product_id: Uuid,
    pub quantity_ordered: Decimal,
    pub quantity_received: Decimal,
    /// Portion of the received quantity accepted into stock on approval
    pub quantity_accepted: Decimal,
    pub discrepancy_quantity: Decimal,
    pub discrepancy_type: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::goods_receipt_note::Entity",
        from = "Column::ReceiptId",
        to = "super::goods_receipt_note::Column::Id"
    )]
    Receipt,
}

impl Related<super::goods_receipt_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
