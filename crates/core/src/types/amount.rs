//! Monetary amounts in the format CiviCRM's API accepts.
//!
//! CiviCRM parses amounts as plain decimal strings with a `.` separator and no
//! thousands grouping. WooCommerce's REST API sends prices as strings too, but
//! uses `""` for products without a price. [`Amount`] normalizes both sides.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A decimal amount, rounded to two places on construction.
///
/// Serializes as a string (`"12.50"`). Deserializes from a string, a number,
/// `null` or the empty string (the last two become zero).
///
/// ```
/// use woo_civi_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(12_345, 3)); // 12.345
/// assert_eq!(amount.to_string(), "12.35");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount, rounding half away from zero to two places.
    #[must_use]
    pub fn new(value: Decimal) -> Self {
        let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        Self(rounded)
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Parse an amount from free text, treating empty input as zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a decimal number.
    pub fn parse(s: &str) -> Result<Self, rust_decimal::Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::ZERO);
        }
        trimmed.parse::<Decimal>().map(Self::new)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        match raw {
            None | Some(serde_json::Value::Null) => Ok(Self::ZERO),
            Some(serde_json::Value::String(s)) => Self::parse(&s).map_err(serde::de::Error::custom),
            Some(serde_json::Value::Number(n)) => {
                // Very large or small floats print in exponent form.
                let text = n.to_string();
                text.parse::<Decimal>()
                    .ok()
                    .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
                    .map(Self::new)
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!("amount out of range: {text}"))
                    })
            }
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected an amount, got {other}"
            ))),
        }
    }
}
