use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per (prefix, day) counter backing human-readable reference numbers.
///
/// Replaces scan-the-latest-row numbering: allocation is an atomic
/// insert-or-increment on this table, so two writers on the same day can
/// never mint the same sequence.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reference_sequences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub prefix: String,
    /// Day the counter belongs to, formatted `YYYYMMDD`
    pub sequence_date: String,
    /// Next value to hand out
    pub next_value: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
