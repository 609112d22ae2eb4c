//! Ledger Errors
//!
//! Error types for ledger repository operations.

/// Ledger result type
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur in the ledger repository
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Referenced login does not exist
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Login already taken
    #[error("Account already exists: {0}")]
    Conflict(String),

    /// Transfer would drive the sender's balance below zero
    #[error("Insufficient funds on account {0}")]
    InsufficientFunds(String),

    /// Any other store constraint, including serialization failures
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Connection or transaction infrastructure failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        if crate::db::is_serialization_failure(&err) {
            LedgerError::ConstraintViolation("concurrent update, transaction aborted".to_string())
        } else if crate::db::is_check_violation(&err)
            || crate::db::is_unique_violation(&err)
            || crate::db::is_numeric_out_of_range(&err)
        {
            LedgerError::ConstraintViolation(err.to_string())
        } else {
            LedgerError::Database(err)
        }
    }
}
