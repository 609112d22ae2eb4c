//! Amount and Balance types
//!
//! Domain primitives for monetary values. A transfer amount is validated at
//! construction time, so a non-positive amount never reaches the ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum decimal places, matching the `NUMERIC(28, 8)` balance column
const MAX_SCALE: u32 = 8;

/// Largest single transfer accepted (10^19), keeps balances inside the column precision
const MAX_AMOUNT: u64 = 10_000_000_000_000_000_000;

fn max_amount() -> Decimal {
    Decimal::from(MAX_AMOUNT)
}

/// Exclusive upper bound of a balance (10^20): `NUMERIC(28, 8)` leaves 20 integer digits
fn balance_limit() -> Decimal {
    max_amount() * Decimal::TEN
}

/// A strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - At most 8 decimal places
/// - At most 10^19
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use account_service::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(100, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(100, 0));
/// assert!(Amount::new(Decimal::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount or moving a Balance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("Balance would become negative (available {available}, requested {requested})")]
    Overdrawn { available: Decimal, requested: Decimal },

    #[error("Balance would exceed the storable range (10^20)")]
    BalanceOverflow,
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::TooManyDecimals` if more than 8 decimal places
    /// - `AmountError::Overflow` if value > 10^19
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }

        // Trailing zeros do not count against the scale: "1.500000000" is fine
        let normalized = value.normalize();
        if normalized.scale() > MAX_SCALE {
            return Err(AmountError::TooManyDecimals(normalized.scale()));
        }

        if value > max_amount() {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Balance represents an account balance (zero or positive).
/// Unlike Amount, Balance can be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance(Decimal);

impl Balance {
    /// Create a new balance (zero or positive)
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Check if balance covers a withdrawal
    pub fn is_sufficient_for(&self, amount: &Amount) -> bool {
        self.0 >= amount.value()
    }

    /// Add amount to balance, refusing to leave the storable range
    pub fn credit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        let credited = self.0 + amount.value();
        if credited >= balance_limit() {
            return Err(AmountError::BalanceOverflow);
        }
        Ok(Balance(credited))
    }

    /// Subtract amount from balance, refusing to go below zero
    pub fn debit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        if !self.is_sufficient_for(amount) {
            return Err(AmountError::Overdrawn {
                available: self.0,
                requested: amount.value(),
            });
        }
        Ok(Balance(self.0 - amount.value()))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(dec!(100));
        assert_eq!(amount.unwrap().value(), dec!(100));
    }

    #[test]
    fn test_amount_zero_rejected() {
        let amount = Amount::new(Decimal::ZERO);
        assert!(matches!(amount, Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_negative_rejected() {
        let amount = Amount::new(dec!(-100));
        assert!(matches!(amount, Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_too_many_decimals() {
        let amount = Amount::new(dec!(0.123456789));
        assert!(matches!(amount, Err(AmountError::TooManyDecimals(9))));
    }

    #[test]
    fn test_amount_trailing_zeros_ignored_for_scale() {
        assert!(Amount::new(dec!(1.500000000000)).is_ok());
    }

    #[test]
    fn test_amount_overflow() {
        let amount = Amount::new(max_amount() + Decimal::ONE);
        assert!(matches!(amount, Err(AmountError::Overflow)));
        assert!(Amount::new(max_amount()).is_ok());
    }

    #[test]
    fn test_amount_deserializes_from_number_and_string() {
        let from_number: Amount = serde_json::from_str("100.5").unwrap();
        let from_string: Amount = serde_json::from_str("\"100.5\"").unwrap();
        assert_eq!(from_number, from_string);

        assert!(serde_json::from_str::<Amount>("0").is_err());
        assert!(serde_json::from_str::<Amount>("-3").is_err());
    }

    #[test]
    fn test_balance_credit_debit() {
        let balance = Balance::zero();
        let balance = balance.credit(&Amount::new(dec!(100)).unwrap()).unwrap();
        assert_eq!(balance.value(), dec!(100));

        let balance = balance.debit(&Amount::new(dec!(30)).unwrap()).unwrap();
        assert_eq!(balance.value(), dec!(70));
    }

    #[test]
    fn test_balance_debit_to_exactly_zero() {
        let balance = Balance::new(dec!(50)).unwrap();
        let balance = balance.debit(&Amount::new(dec!(50)).unwrap()).unwrap();
        assert_eq!(balance, Balance::zero());
    }

    #[test]
    fn test_balance_insufficient() {
        let balance = Balance::new(dec!(50)).unwrap();
        let amount = Amount::new(dec!(100)).unwrap();

        assert!(!balance.is_sufficient_for(&amount));
        assert_eq!(
            balance.debit(&amount),
            Err(AmountError::Overdrawn {
                available: dec!(50),
                requested: dec!(100),
            })
        );
    }

    #[test]
    fn test_balance_credit_past_column_range() {
        let almost_full = Balance::new(balance_limit() - Decimal::ONE).unwrap();

        let result = almost_full.credit(&Amount::new(Decimal::ONE).unwrap());
        assert_eq!(result, Err(AmountError::BalanceOverflow));

        let result = almost_full.credit(&Amount::new(dec!(0.99999999)).unwrap());
        assert_eq!(result.unwrap().value(), dec!(99999999999999999999.99999999));
    }

    #[test]
    fn test_balance_display_is_normalized() {
        assert_eq!(Balance::new(dec!(900.00000000)).unwrap().to_string(), "900");
        assert_eq!(Balance::new(dec!(12.50)).unwrap().to_string(), "12.5");
    }
}
