use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status workflow for goods receipt notes:
/// draft -> verified | discrepancy -> approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Draft,
    Verified,
    Discrepancy,
    Approved,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Draft => "draft",
            ReceiptStatus::Verified => "verified",
            ReceiptStatus::Discrepancy => "discrepancy",
            ReceiptStatus::Approved => "approved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ReceiptStatus::Draft),
            "verified" => Some(ReceiptStatus::Verified),
            "discrepancy" => Some(ReceiptStatus::Discrepancy),
            "approved" => Some(ReceiptStatus::Approved),
            _ => None,
        }
    }

    pub fn is_approvable(&self) -> bool {
        matches!(self, ReceiptStatus::Verified | ReceiptStatus::Discrepancy)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goods_receipt_notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub receipt_number: String,
    pub purchase_order_id: Uuid,
    pub warehouse_id: Uuid,
    pub status: String,
    pub has_discrepancy: bool,
    pub received_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::goods_receipt_item::Entity")]
    Items,
}

impl Related<super::goods_receipt_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
