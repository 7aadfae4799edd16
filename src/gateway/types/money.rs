//! Money input type for API boundary enforcement

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::parse_strict;

/// Strict format Decimal - validates format during deserialization
///
/// Only JSON strings are accepted; JSON numbers would bypass the format
/// rules. Rejects `.5`, `5.`, `+5`, empty strings and scientific notation.
///
/// Sign and precision are business rules and are left to the engine, which
/// reports them as `InvalidAmount`.
#[derive(Debug, Clone, Copy)]
pub struct StrictDecimal(Decimal);

impl StrictDecimal {
    /// Get the inner Decimal value
    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl std::ops::Deref for StrictDecimal {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for StrictDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let s = String::deserialize(deserializer)?;
        parse_strict(&s)
            .map(StrictDecimal)
            .map_err(|e| D::Error::custom(e.to_string()))
    }
}

impl Serialize for StrictDecimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Serialize as string to preserve precision
        serializer.serialize_str(&self.0.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accepts_plain_strings() {
        let d: StrictDecimal = serde_json::from_str("\"40.00\"").unwrap();
        assert_eq!(d.inner(), dec!(40.00));
        // Sign is a business rule, not a format rule
        let neg: StrictDecimal = serde_json::from_str("\"-1\"").unwrap();
        assert_eq!(*neg, dec!(-1));
    }

    #[test]
    fn test_rejects_json_numbers_and_loose_formats() {
        assert!(serde_json::from_str::<StrictDecimal>("40").is_err());
        for bad in ["\".5\"", "\"5.\"", "\"1e2\"", "\"+1\"", "\"\""] {
            assert!(serde_json::from_str::<StrictDecimal>(bad).is_err(), "{}", bad);
        }
    }
}
