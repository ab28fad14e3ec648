use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status workflow for production orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionOrderStatus {
    Draft,
    Released,
    InProgress,
    Completed,
    Cancelled,
}

impl ProductionOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionOrderStatus::Draft => "draft",
            ProductionOrderStatus::Released => "released",
            ProductionOrderStatus::InProgress => "in_progress",
            ProductionOrderStatus::Completed => "completed",
            ProductionOrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ProductionOrderStatus::Draft),
            "released" => Some(ProductionOrderStatus::Released),
            "in_progress" => Some(ProductionOrderStatus::InProgress),
            "completed" => Some(ProductionOrderStatus::Completed),
            "cancelled" => Some(ProductionOrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// Production order for a finished good; its items are the material lines
/// the reservation protocol runs over.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_number: String,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub status: String,
    pub released_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::production_order_item::Entity")]
    Items,
}

impl Related<super::production_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
