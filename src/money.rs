//! Money Module
//!
//! All monetary quantities in the system go through the two types defined
//! here. Both wrap `rust_decimal::Decimal`; binary floating point never
//! touches money.
//!
//! - [`Amount`]: a strictly positive quantity moved by one operation
//! - [`Balance`]: a non-negative account balance with checked mutations
//!
//! ## Canonical scale
//! Amounts and balances are held at [`MONEY_SCALE`] fractional digits
//! (cents). Inputs with more precision are rejected, never rounded.
//!
//! ## Usage
//! ```rust
//! use payment_system::money::{Amount, Balance};
//!
//! let mut balance = Balance::ZERO;
//! balance.credit(Amount::parse("100").unwrap()).unwrap();
//! balance.debit(Amount::parse("40.00").unwrap()).unwrap();
//! assert_eq!(balance.to_string(), "60.00");
//! ```

use std::fmt;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fractional digits carried by every amount and balance.
pub const MONEY_SCALE: u32 = 2;

// ============================================================================
// Error Types
// ============================================================================

/// Money validation and arithmetic errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Balance cannot be negative")]
    NegativeBalance,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Balance overflow")]
    Overflow,
}

// ============================================================================
// Amount
// ============================================================================

/// Strictly positive monetary amount.
///
/// Construction is the only validation point: once an `Amount` exists it is
/// known to be `> 0` and to fit the canonical scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Validate a decimal as a transferable amount.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value <= Decimal::ZERO {
            return Err(MoneyError::InvalidAmount);
        }
        let provided = value.normalize().scale();
        if provided > MONEY_SCALE {
            return Err(MoneyError::PrecisionOverflow {
                provided,
                max: MONEY_SCALE,
            });
        }
        let mut value = value;
        value.rescale(MONEY_SCALE);
        Ok(Self(value))
    }

    /// Parse a client-supplied amount string.
    ///
    /// Rejects `.5`, `5.`, `+5`, scientific notation and empty input before
    /// handing the text to `Decimal`.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        Self::new(parse_strict(s)?)
    }

    #[inline]
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(a: Amount) -> Self {
        a.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Balance
// ============================================================================

/// Account balance.
///
/// # Invariant
/// `balance >= 0` at all times. The field is private and every mutation is
/// checked, so no code path can produce a negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

impl Balance {
    pub const ZERO: Balance = Balance(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));

    /// Wrap a stored decimal, rejecting negative values.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MoneyError::NegativeBalance);
        }
        let mut value = value;
        value.rescale(MONEY_SCALE);
        Ok(Self(value))
    }

    #[inline]
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Whether `amount` can be taken out without going negative.
    #[inline]
    pub fn covers(self, amount: Amount) -> bool {
        self.0 >= amount.0
    }

    /// Remove `amount` from the balance.
    ///
    /// # Errors
    /// - `InsufficientFunds` if `balance < amount`; the balance is unchanged
    pub fn debit(&mut self, amount: Amount) -> Result<(), MoneyError> {
        if !self.covers(amount) {
            return Err(MoneyError::InsufficientFunds);
        }
        self.0 = self
            .0
            .checked_sub(amount.0)
            .ok_or(MoneyError::Overflow)?;
        Ok(())
    }

    /// Add `amount` to the balance.
    pub fn credit(&mut self, amount: Amount) -> Result<(), MoneyError> {
        self.0 = self
            .0
            .checked_add(amount.0)
            .ok_or(MoneyError::Overflow)?;
        Ok(())
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(b: Balance) -> Self {
        b.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Parse helpers
// ============================================================================

/// Strict decimal parsing for API input.
pub fn parse_strict(s: &str) -> Result<Decimal, MoneyError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }
    if s.starts_with('.') {
        return Err(MoneyError::InvalidFormat(
            "missing leading zero (e.g., use 0.5 instead of .5)".into(),
        ));
    }
    if s.ends_with('.') {
        return Err(MoneyError::InvalidFormat(
            "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
        ));
    }
    if s.contains(['e', 'E']) {
        return Err(MoneyError::InvalidFormat(
            "scientific notation not allowed".into(),
        ));
    }
    if s.starts_with('+') {
        return Err(MoneyError::InvalidFormat("+ prefix not allowed".into()));
    }
    Decimal::from_str(s).map_err(|e| MoneyError::InvalidFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_rejects_zero_and_negative() {
        assert_eq!(Amount::new(dec!(0)), Err(MoneyError::InvalidAmount));
        assert_eq!(Amount::new(dec!(-1.50)), Err(MoneyError::InvalidAmount));
    }

    #[test]
    fn test_amount_rejects_sub_cent_precision() {
        assert_eq!(
            Amount::new(dec!(1.005)),
            Err(MoneyError::PrecisionOverflow {
                provided: 3,
                max: 2
            })
        );
        // Trailing zeros are not extra precision
        assert!(Amount::new(dec!(1.5000)).is_ok());
    }

    #[test]
    fn test_amount_canonical_scale() {
        assert_eq!(Amount::parse("40").unwrap().to_string(), "40.00");
        assert_eq!(Amount::parse("0.1").unwrap().to_string(), "0.10");
    }

    #[test]
    fn test_parse_strict_formats() {
        assert!(parse_strict(".5").is_err());
        assert!(parse_strict("5.").is_err());
        assert!(parse_strict("1e3").is_err());
        assert!(parse_strict("+5").is_err());
        assert!(parse_strict("").is_err());
        assert!(parse_strict("abc").is_err());
        assert_eq!(parse_strict(" 12.34 ").unwrap(), dec!(12.34));
    }

    #[test]
    fn test_balance_debit_never_goes_negative() {
        let mut b = Balance::new(dec!(10.00)).unwrap();
        let err = b.debit(Amount::new(dec!(50)).unwrap()).unwrap_err();
        assert_eq!(err, MoneyError::InsufficientFunds);
        assert_eq!(b.value(), dec!(10.00));

        b.debit(Amount::new(dec!(10)).unwrap()).unwrap();
        assert_eq!(b, Balance::ZERO);
    }

    #[test]
    fn test_balance_credit_and_covers() {
        let mut b = Balance::ZERO;
        let forty = Amount::new(dec!(40)).unwrap();
        assert!(!b.covers(forty));
        b.credit(forty).unwrap();
        assert!(b.covers(forty));
        assert_eq!(b.to_string(), "40.00");
    }

    #[test]
    fn test_balance_rejects_negative() {
        assert_eq!(
            Balance::new(dec!(-0.01)),
            Err(MoneyError::NegativeBalance)
        );
        assert!(Balance::new(dec!(0)).is_ok());
    }

    #[test]
    fn test_serde_as_string() {
        let a = Amount::new(dec!(12.5)).unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"12.50\"");
        let back: Amount = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(back, a);
        assert!(serde_json::from_str::<Amount>("\"-1\"").is_err());
    }
}
