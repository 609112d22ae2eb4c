//! In-memory Ledger Repository
//!
//! A single table behind a mutex. Each operation takes the lock once, so a
//! transfer's checks and both balance updates happen as one step.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Amount, Balance};

use super::{AccountId, LedgerError, LedgerRepository, LedgerResult};

#[derive(Debug, Clone)]
struct AccountRow {
    id: AccountId,
    password_digest: String,
    balance: Balance,
}

#[derive(Debug, Default)]
struct Table {
    rows: HashMap<String, AccountRow>,
    last_id: AccountId,
}

impl Table {
    fn insert(&mut self, login: &str, digest: &str, balance: Balance) -> LedgerResult<AccountId> {
        if self.rows.contains_key(login) {
            return Err(LedgerError::Conflict(login.to_string()));
        }

        self.last_id += 1;
        self.rows.insert(
            login.to_string(),
            AccountRow {
                id: self.last_id,
                password_digest: digest.to_string(),
                balance,
            },
        );
        Ok(self.last_id)
    }

    fn row(&self, login: &str) -> LedgerResult<&AccountRow> {
        self.rows
            .get(login)
            .ok_or_else(|| LedgerError::NotFound(login.to_string()))
    }
}

/// Ledger repository kept entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryLedgerRepository {
    table: Mutex<Table>,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account with an opening balance
    pub fn seed(&self, login: &str, digest: &str, balance: Decimal) -> LedgerResult<AccountId> {
        let balance = Balance::new(balance)
            .map_err(|e| LedgerError::ConstraintViolation(e.to_string()))?;
        self.lock().insert(login, digest, balance)
    }

    /// Sum of every balance in the table
    pub fn total_balance(&self) -> Decimal {
        self.lock().rows.values().map(|row| row.balance.value()).sum()
    }

    pub fn account_id(&self, login: &str) -> Option<AccountId> {
        self.lock().rows.get(login).map(|row| row.id)
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // A panic while holding the lock cannot leave a half-applied
        // transfer behind, so the data is still consistent
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn find_digest_by_login(&self, login: &str) -> LedgerResult<String> {
        Ok(self.lock().row(login)?.password_digest.clone())
    }

    async fn create_account(&self, login: &str, digest: &str) -> LedgerResult<AccountId> {
        self.lock().insert(login, digest, Balance::zero())
    }

    async fn find_balance_by_login(&self, login: &str) -> LedgerResult<Decimal> {
        Ok(self.lock().row(login)?.balance.value())
    }

    async fn transfer(&self, sender: &str, recipient: &str, amount: Amount) -> LedgerResult<()> {
        let mut table = self.lock();

        // Same order as the store: sender, funds, recipient, column range.
        // Nothing is written until every check passes.
        let debited = table
            .row(sender)?
            .balance
            .debit(&amount)
            .map_err(|_| LedgerError::InsufficientFunds(sender.to_string()))?;
        let recipient_balance = table.row(recipient)?.balance;

        if sender == recipient {
            return Ok(());
        }

        let credited = recipient_balance
            .credit(&amount)
            .map_err(|e| LedgerError::ConstraintViolation(e.to_string()))?;

        if let Some(row) = table.rows.get_mut(sender) {
            row.balance = debited;
        }
        if let Some(row) = table.rows.get_mut(recipient) {
            row.balance = credited;
        }

        Ok(())
    }
}
