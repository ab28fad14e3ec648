use sea_orm::error::DbErr;
use uuid::Uuid;

/// Unified error type returned by every service in this crate.
///
/// Ledger guards are local: a failed `reserve` or `remove_stock` returns an
/// error without mutating anything. Document-level failures are
/// transactional: the enclosing `db.begin()` scope rolls back every effect
/// applied so far in that call before the error reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    /// A state-machine method was invoked from the wrong state.
    #[error("Invalid transition: cannot {action} from status '{from}'")]
    InvalidTransition { from: String, action: &'static str },

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(Uuid),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Helper to convert any error type that can be converted to DbErr
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    pub fn invalid_transition(from: impl Into<String>, action: &'static str) -> Self {
        ServiceError::InvalidTransition {
            from: from.into(),
            action,
        }
    }
}

/// Trait for converting errors to DbErr
pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_names_state_and_action() {
        let err = ServiceError::invalid_transition("issued", "reserve");
        assert_eq!(
            err.to_string(),
            "Invalid transition: cannot reserve from status 'issued'"
        );
    }

    #[test]
    fn db_error_helper_wraps_custom_messages() {
        let err = ServiceError::db_error("boom");
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }
}
