//! Database module
//!
//! Connection, schema and transaction utilities.

use sqlx::{PgPool, Postgres, Transaction};

/// Schema of the credential store
pub const SCHEMA: &str = include_str!("../migrations/0001_create_accounts.sql");

/// Create the accounts table if it does not exist yet
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let required_tables = ["accounts"];

    for table in required_tables {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}

// =========================================================================
// Transactions
// =========================================================================

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadCommitted,
    Serializable,
}

impl IsolationLevel {
    fn set_statement(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            IsolationLevel::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

/// Acquire a connection and open a transaction at the given isolation level.
///
/// Auto-commit is off until `finish` is called. If the transaction is
/// dropped without `finish`, sqlx rolls it back and returns the connection.
pub async fn begin(
    pool: &PgPool,
    isolation: IsolationLevel,
) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(isolation.set_statement())
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Commit if the unit of work succeeded, roll back otherwise.
///
/// The unit of work's error is returned even if the rollback itself fails.
pub async fn finish<T, E>(tx: Transaction<'_, Postgres>, outcome: Result<T, E>) -> Result<T, E>
where
    E: From<sqlx::Error>,
{
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

// =========================================================================
// Postgres error classification
// =========================================================================

const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
        _ => None,
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).is_some_and(|code| code == UNIQUE_VIOLATION)
}

pub fn is_check_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).is_some_and(|code| code == CHECK_VIOLATION)
}

/// A value did not fit its column, e.g. a balance past `NUMERIC(28, 8)`
pub fn is_numeric_out_of_range(err: &sqlx::Error) -> bool {
    sqlstate(err).is_some_and(|code| code == NUMERIC_VALUE_OUT_OF_RANGE)
}

/// Concurrent transactions could not be serialized; the statement was aborted
pub fn is_serialization_failure(err: &sqlx::Error) -> bool {
    sqlstate(err).is_some_and(|code| code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_statements() {
        assert!(IsolationLevel::Serializable
            .set_statement()
            .ends_with("SERIALIZABLE"));
        assert!(IsolationLevel::ReadCommitted
            .set_statement()
            .ends_with("READ COMMITTED"));
    }

    #[test]
    fn test_non_database_errors_are_unclassified() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
        assert!(!is_check_violation(&err));
        assert!(!is_serialization_failure(&err));
        assert!(!is_numeric_out_of_range(&err));
    }

    #[test]
    fn test_schema_enforces_invariants() {
        assert!(SCHEMA.contains("UNIQUE"));
        assert!(SCHEMA.contains("CHECK (balance >= 0)"));
    }
}
