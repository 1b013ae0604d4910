//! Money type
//!
//! Domain primitive for monetary values. All values are validated at
//! construction time, so a negative balance or amount cannot exist in the
//! system; debits that would go below zero fail instead of wrapping.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum representable value (1 trillion, any currency)
const MAX_VALUE: &str = "1000000000000";

/// Maximum fractional digits (minor units of every supported currency)
const MAX_SCALE: u32 = 2;

/// Money represents a validated non-negative monetary value.
///
/// # Invariants
/// - Value is never negative
/// - Maximum 2 fractional digits
/// - Maximum value is 1 trillion
///
/// Arithmetic returns new instances; `credit`/`debit` validate the result
/// so an unchecked subtraction can never leak a negative balance.
///
/// # Example
/// ```
/// use teller_core::domain::Money;
///
/// let balance: Money = "100.50".parse().unwrap();
/// let after = balance.debit(&"40.25".parse().unwrap()).unwrap();
/// assert_eq!(after.to_string(), "60.25");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(Decimal);

/// Errors that can occur when creating or combining Money values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Money cannot be negative (got {0})")]
    Negative(Decimal),

    #[error("Money has too many fractional digits (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Money exceeds maximum allowed value ({MAX_VALUE})")]
    Overflow,

    #[error("Invalid money format: {0}")]
    ParseError(String),
}

impl Money {
    /// Create a new Money value with validation.
    ///
    /// # Errors
    /// - `MoneyError::Negative` if value < 0
    /// - `MoneyError::TooManyDecimals` if more than 2 fractional digits
    /// - `MoneyError::Overflow` if value > 1 trillion
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value < Decimal::ZERO {
            return Err(MoneyError::Negative(value));
        }

        if value.scale() > MAX_SCALE {
            return Err(MoneyError::TooManyDecimals(value.scale()));
        }

        let max = Decimal::from_str(MAX_VALUE).expect("Invalid MAX_VALUE constant");
        if value > max {
            return Err(MoneyError::Overflow);
        }

        Ok(Self(value))
    }

    /// The zero value.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Check whether this value covers a requested amount.
    pub fn is_sufficient_for(&self, amount: &Money) -> bool {
        self.0 >= amount.0
    }

    /// Add an amount, returning a new value.
    pub fn credit(&self, amount: &Money) -> Result<Money, MoneyError> {
        Money::new(self.0 + amount.0)
    }

    /// Subtract an amount, returning a new value. Fails if the result
    /// would be negative.
    pub fn debit(&self, amount: &Money) -> Result<Money, MoneyError> {
        Money::new(self.0 - amount.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| MoneyError::ParseError(e.to_string()))?;
        Money::new(decimal)
    }
}

impl TryFrom<String> for Money {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Money::from_str(&value)
    }
}

impl From<Money> for String {
    fn from(money: Money) -> Self {
        format!("{:.2}", money.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_non_negative() {
        let money = Money::new(dec!(100));
        assert!(money.is_ok());
        assert_eq!(money.unwrap().value(), dec!(100));
    }

    #[test]
    fn test_money_zero_allowed() {
        let money = Money::new(Decimal::ZERO);
        assert!(money.is_ok());
        assert!(money.unwrap().is_zero());
    }

    #[test]
    fn test_money_negative_rejected() {
        let money = Money::new(dec!(-100));
        assert!(matches!(money, Err(MoneyError::Negative(_))));
    }

    #[test]
    fn test_money_too_many_decimals() {
        let money = Money::new(dec!(0.125));
        assert!(matches!(money, Err(MoneyError::TooManyDecimals(3))));
    }

    #[test]
    fn test_money_max_decimals_ok() {
        assert!(Money::new(dec!(0.12)).is_ok());
    }

    #[test]
    fn test_money_overflow() {
        let value = Decimal::from_str("1000000000001").unwrap();
        assert!(matches!(Money::new(value), Err(MoneyError::Overflow)));
    }

    #[test]
    fn test_money_from_str() {
        let money: Result<Money, _> = "123.45".parse();
        assert!(money.is_ok());
        assert_eq!(money.unwrap().value(), dec!(123.45));

        let bad: Result<Money, _> = "abc".parse();
        assert!(matches!(bad, Err(MoneyError::ParseError(_))));
    }

    #[test]
    fn test_credit_debit() {
        let balance = Money::zero();
        let amount = Money::new(dec!(100)).unwrap();

        let balance = balance.credit(&amount).unwrap();
        assert_eq!(balance.value(), dec!(100));

        let withdraw = Money::new(dec!(30)).unwrap();
        let balance = balance.debit(&withdraw).unwrap();
        assert_eq!(balance.value(), dec!(70));
    }

    #[test]
    fn test_debit_below_zero_rejected() {
        let balance = Money::new(dec!(50)).unwrap();
        let amount = Money::new(dec!(100)).unwrap();

        assert!(!balance.is_sufficient_for(&amount));
        assert!(matches!(balance.debit(&amount), Err(MoneyError::Negative(_))));
    }
}
