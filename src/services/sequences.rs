//! Reference number allocation.
//!
//! Numbers follow `PREFIX-YYYYMMDD-NNNN` with the 4-digit sequence restarting
//! each day per prefix. Allocation is an insert-or-increment on the
//! `reference_sequences` counter table guarded by a compare-and-swap, so no
//! two writers can mint the same number; there is no scanning of previously
//! issued rows.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::reference_sequence::{self, Entity as ReferenceSequenceEntity};
use crate::errors::ServiceError;

const MAX_ATTEMPTS: u32 = 5;

/// Allocates the next reference number for a prefix, e.g. `GRN-20260825-0001`.
///
/// Call this inside the transaction that persists the document so an aborted
/// create does not burn a visible gap on commit-then-fail.
pub async fn next_reference<C: ConnectionTrait>(
    conn: &C,
    prefix: &str,
) -> Result<String, ServiceError> {
    let today = Utc::now().format("%Y%m%d").to_string();

    for attempt in 0..MAX_ATTEMPTS {
        let existing = ReferenceSequenceEntity::find()
            .filter(reference_sequence::Column::Prefix.eq(prefix))
            .filter(reference_sequence::Column::SequenceDate.eq(today.clone()))
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?;

        match existing {
            Some(row) => {
                let result = ReferenceSequenceEntity::update_many()
                    .col_expr(
                        reference_sequence::Column::NextValue,
                        Expr::value(row.next_value + 1),
                    )
                    .col_expr(
                        reference_sequence::Column::UpdatedAt,
                        Expr::value(Utc::now()),
                    )
                    .filter(reference_sequence::Column::Id.eq(row.id))
                    .filter(reference_sequence::Column::NextValue.eq(row.next_value))
                    .exec(conn)
                    .await
                    .map_err(ServiceError::db_error)?;

                if result.rows_affected == 1 {
                    return Ok(format_reference(prefix, &today, row.next_value));
                }
                debug!(prefix, attempt, "Lost sequence increment race, retrying");
            }
            None => {
                let fresh = reference_sequence::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    prefix: Set(prefix.to_string()),
                    sequence_date: Set(today.clone()),
                    next_value: Set(2),
                    updated_at: Set(Utc::now()),
                };
                match fresh.insert(conn).await {
                    Ok(_) => return Ok(format_reference(prefix, &today, 1)),
                    // Another writer created today's row first; loop to
                    // increment it instead.
                    Err(_) => {
                        debug!(prefix, attempt, "Lost sequence insert race, retrying");
                    }
                }
            }
        }
    }

    Err(ServiceError::InternalError(format!(
        "Could not allocate reference number for prefix {} after {} attempts",
        prefix, MAX_ATTEMPTS
    )))
}

fn format_reference(prefix: &str, date: &str, sequence: i64) -> String {
    format!("{}-{}-{:04}", prefix, date, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_format_pads_to_four_digits() {
        assert_eq!(format_reference("GRN", "20260825", 1), "GRN-20260825-0001");
        assert_eq!(format_reference("TRF", "20260825", 42), "TRF-20260825-0042");
        assert_eq!(
            format_reference("ADJ", "20260825", 12345),
            "ADJ-20260825-12345"
        );
    }
}
