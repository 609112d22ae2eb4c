//! Postgres Ledger Repository
//!
//! Consistency is delegated to the store: transfers run SERIALIZABLE and the
//! `balance >= 0` CHECK constraint aborts any debit that would overdraw.
//! No in-process locks are held.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

use crate::config::Config;
use crate::db::{self, IsolationLevel};
use crate::domain::Amount;

use super::{AccountId, LedgerError, LedgerRepository, LedgerResult};

/// Ledger repository backed by the `accounts` table
#[derive(Debug, Clone)]
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    /// Create a repository over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool sized from the startup configuration
    pub async fn connect(config: &Config) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    // Units of work (run inside a transaction opened by the caller)
    // =========================================================================

    async fn select_digest(conn: &mut PgConnection, login: &str) -> LedgerResult<String> {
        let digest: Option<String> =
            sqlx::query_scalar("SELECT password_digest FROM accounts WHERE login = $1")
                .bind(login)
                .fetch_optional(&mut *conn)
                .await?;

        digest.ok_or_else(|| LedgerError::NotFound(login.to_string()))
    }

    async fn insert_account(
        conn: &mut PgConnection,
        login: &str,
        digest: &str,
    ) -> LedgerResult<AccountId> {
        sqlx::query_scalar(
            r#"
            INSERT INTO accounts (login, password_digest, balance)
            VALUES ($1, $2, 0)
            RETURNING id
            "#,
        )
        .bind(login)
        .bind(digest)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                LedgerError::Conflict(login.to_string())
            } else {
                LedgerError::from(e)
            }
        })
    }

    async fn select_balance(conn: &mut PgConnection, login: &str) -> LedgerResult<Decimal> {
        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM accounts WHERE login = $1")
                .bind(login)
                .fetch_optional(&mut *conn)
                .await?;

        balance.ok_or_else(|| LedgerError::NotFound(login.to_string()))
    }

    /// Debit the sender then credit the recipient.
    ///
    /// Any error returned here makes the caller roll back, so a missing
    /// recipient also undoes the debit.
    async fn move_funds(
        conn: &mut PgConnection,
        sender: &str,
        recipient: &str,
        amount: Decimal,
    ) -> LedgerResult<()> {
        let debited = sqlx::query(
            "UPDATE accounts SET balance = balance - $1 WHERE login = $2",
        )
        .bind(amount)
        .bind(sender)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if db::is_check_violation(&e) {
                LedgerError::InsufficientFunds(sender.to_string())
            } else {
                LedgerError::from(e)
            }
        })?
        .rows_affected();

        if debited == 0 {
            return Err(LedgerError::NotFound(sender.to_string()));
        }

        let credited = sqlx::query(
            "UPDATE accounts SET balance = balance + $1 WHERE login = $2",
        )
        .bind(amount)
        .bind(recipient)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if credited == 0 {
            return Err(LedgerError::NotFound(recipient.to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn find_digest_by_login(&self, login: &str) -> LedgerResult<String> {
        let mut tx = db::begin(&self.pool, IsolationLevel::ReadCommitted).await?;
        let outcome = Self::select_digest(&mut tx, login).await;
        db::finish(tx, outcome).await
    }

    async fn create_account(&self, login: &str, digest: &str) -> LedgerResult<AccountId> {
        let mut tx = db::begin(&self.pool, IsolationLevel::ReadCommitted).await?;
        let outcome = Self::insert_account(&mut tx, login, digest).await;
        let id = db::finish(tx, outcome).await?;

        tracing::debug!(account_id = id, login = %login, "Account row inserted");
        Ok(id)
    }

    async fn find_balance_by_login(&self, login: &str) -> LedgerResult<Decimal> {
        let mut tx = db::begin(&self.pool, IsolationLevel::ReadCommitted).await?;
        let outcome = Self::select_balance(&mut tx, login).await;
        db::finish(tx, outcome).await
    }

    async fn transfer(&self, sender: &str, recipient: &str, amount: Amount) -> LedgerResult<()> {
        let mut tx = db::begin(&self.pool, IsolationLevel::Serializable).await?;
        let outcome = Self::move_funds(&mut tx, sender, recipient, amount.value()).await;

        if let Err(ref e) = outcome {
            tracing::debug!(
                sender = %sender,
                recipient = %recipient,
                amount = %amount,
                error = %e,
                "Transfer rolled back"
            );
        }

        db::finish(tx, outcome).await
    }
}
