//! Domain module
//!
//! Core domain types shared by the ledger and the HTTP layer.

pub mod amount;

pub use amount::{Amount, AmountError, Balance};
