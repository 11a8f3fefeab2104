//! Ticker symbol definitions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::SymbolError;

/// Tolerance in points applied before truncation, so that a diff such as
/// `0.00051` which is stored as `0.000509999…` still counts as 51 points.
const POINTS_EPSILON: f64 = 1e-6;

/// An uppercase currency-pair or crypto ticker (e.g. "EURUSD", "BTCUSD").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Creates a symbol, trimming and upper-casing the input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or not alphanumeric.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, SymbolError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(SymbolError::Empty);
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SymbolError::InvalidCharacters(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is a BTC pair.
    #[must_use]
    pub fn is_crypto(&self) -> bool {
        self.0.contains("BTC")
    }

    /// Returns the number of decimal places quoted for this symbol.
    ///
    /// JPY pairs are quoted with 3 decimals, BTC pairs with 2, everything
    /// else with 5.
    #[must_use]
    pub fn precision(&self) -> u8 {
        if self.0.contains("JPY") {
            3
        } else if self.is_crypto() {
            2
        } else {
            5
        }
    }

    /// Returns `10^precision`.
    #[must_use]
    pub fn decimal_factor(&self) -> f64 {
        10f64.powi(i32::from(self.precision()))
    }

    /// Converts a price difference to points, truncating toward zero.
    ///
    /// Crypto symbols are measured in whole price units instead.
    #[must_use]
    pub fn to_points(&self, diff: f64) -> i64 {
        let scaled = if self.is_crypto() {
            diff
        } else {
            diff * self.decimal_factor()
        };
        (scaled + scaled.signum() * POINTS_EPSILON).trunc() as i64
    }

    /// Converts points back to a price difference.
    #[must_use]
    pub fn from_points(&self, points: i64) -> f64 {
        if self.is_crypto() {
            points as f64
        } else {
            points as f64 / self.decimal_factor()
        }
    }

    /// Formats a price with this symbol's precision.
    #[must_use]
    pub fn format_price(&self, price: f64) -> String {
        format!("{:.*}", usize::from(self.precision()), price)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    #[test]
    fn test_symbol_normalized() {
        assert_eq!(sym(" eurusd ").as_str(), "EURUSD");
        assert_eq!(Symbol::new("  "), Err(SymbolError::Empty));
        assert!(matches!(
            Symbol::new("EUR/USD"),
            Err(SymbolError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_precision() {
        assert_eq!(sym("USDJPY").precision(), 3);
        assert_eq!(sym("BTCUSD").precision(), 2);
        assert_eq!(sym("EURUSD").precision(), 5);
    }

    #[test]
    fn test_to_points_five_decimals() {
        let eurusd = sym("EURUSD");
        assert_eq!(eurusd.to_points(0.00051), 51);
        assert_eq!(eurusd.to_points(0.00049), 49);
        assert_eq!(eurusd.to_points(1.10051 - 1.10000), 51);
        assert_eq!(eurusd.to_points(-0.00051), -51);
    }

    #[test]
    fn test_to_points_jpy_and_crypto() {
        assert_eq!(sym("USDJPY").to_points(0.123), 123);
        assert_eq!(sym("BTCUSD").to_points(499.9), 499);
        assert_eq!(sym("BTCUSD").to_points(500.0), 500);
    }

    #[test]
    fn test_from_points() {
        assert!((sym("EURUSD").from_points(50) - 0.0005).abs() < 1e-12);
        assert!((sym("USDJPY").from_points(50) - 0.05).abs() < 1e-12);
        assert!((sym("BTCUSD").from_points(50) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_serde_uppercases() {
        let s: Symbol = serde_json::from_str("\"gbpusd\"").unwrap();
        assert_eq!(s.as_str(), "GBPUSD");
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"GBPUSD\"");
    }
}
