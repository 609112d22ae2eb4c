//! Ledger Repository
//!
//! Account lookups, account creation and the atomic transfer operation.
//! Every operation is a single unit of work against the store: it either
//! takes full effect or none.

mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::Amount;

pub use error::{LedgerError, LedgerResult};
pub use memory::InMemoryLedgerRepository;
pub use postgres::PgLedgerRepository;

/// Server-assigned account identifier
pub type AccountId = i64;

/// Storage operations used by the request handlers
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Password digest stored for `login`
    async fn find_digest_by_login(&self, login: &str) -> LedgerResult<String>;

    /// Register a new account with a zero balance
    async fn create_account(&self, login: &str, digest: &str) -> LedgerResult<AccountId>;

    /// Current balance of `login`
    async fn find_balance_by_login(&self, login: &str) -> LedgerResult<Decimal>;

    /// Move `amount` from `sender` to `recipient`.
    ///
    /// Fails with `NotFound` when either account is absent and with
    /// `InsufficientFunds` when the sender cannot cover the amount. On any
    /// failure neither balance changes.
    async fn transfer(&self, sender: &str, recipient: &str, amount: Amount) -> LedgerResult<()>;
}
