//! account_service Library
//!
//! Re-exports modules for the binary and for integration testing.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod ledger;

pub use api::{build_app, AppState};
pub use config::Config;
pub use domain::{Amount, AmountError, Balance};
pub use error::{AppError, AppResult};
pub use ledger::{InMemoryLedgerRepository, LedgerError, LedgerRepository, PgLedgerRepository};
