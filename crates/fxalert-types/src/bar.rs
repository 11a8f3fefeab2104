//! OHLC bar representation.

use serde::{Deserialize, Serialize};

use crate::Symbol;

/// A single OHLC price observation for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The quoted symbol.
    pub symbol: Symbol,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing (latest) price.
    pub close: f64,
}

impl Bar {
    /// Creates a new bar.
    #[must_use]
    pub const fn new(symbol: Symbol, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            symbol,
            open,
            high,
            low,
            close,
        }
    }

    /// Creates a bar where every price equals `price`.
    ///
    /// This is the first observation of an aggregation bucket.
    #[must_use]
    pub const fn flat(symbol: Symbol, price: f64) -> Self {
        Self::new(symbol, price, price, price, price)
    }

    /// Returns true if every price is finite and strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }

    /// Folds another observed close into this bar.
    ///
    /// High and low track the extreme closes, close tracks the latest one and
    /// open stays at the first observation.
    pub fn observe_close(&mut self, close: f64) {
        self.high = self.high.max(close);
        self.low = self.low.min(close);
        self.close = close;
    }

    /// Returns the price range (high - low).
    #[must_use]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Returns the distance from the top of the body to the high.
    #[must_use]
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Returns the distance from the low to the bottom of the body.
    #[must_use]
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }
}

impl std::fmt::Display for Bar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = usize::from(self.symbol.precision());
        write!(
            f,
            "{} - o: {:.p$} h: {:.p$} l: {:.p$} c: {:.p$}",
            self.symbol, self.open, self.high, self.low, self.close
        )
    }
}

/// The previous/current bar pair the holder serves for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    /// Bar from before the most recent successful update.
    pub previous: Bar,
    /// Bar from the most recent successful update.
    pub current: Bar,
}

impl SymbolSnapshot {
    /// Creates the snapshot for a first observation (`previous == current`).
    #[must_use]
    pub fn first(bar: Bar) -> Self {
        Self {
            previous: bar.clone(),
            current: bar,
        }
    }

    /// Moves `current` into `previous` and stores the new bar.
    pub fn rotate(&mut self, bar: Bar) {
        self.previous = std::mem::replace(&mut self.current, bar);
    }

    /// Returns `current.close - previous.close`.
    #[must_use]
    pub fn close_diff(&self) -> f64 {
        self.current.close - self.previous.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn eurusd() -> Symbol {
        Symbol::new("EURUSD").unwrap()
    }

    #[test]
    fn test_validity() {
        assert!(Bar::new(eurusd(), 1.1, 1.2, 1.0, 1.15).is_valid());
        assert!(!Bar::new(eurusd(), 1.1, 1.2, 0.0, 1.15).is_valid());
        assert!(!Bar::new(eurusd(), -1.0, 1.2, 1.0, 1.15).is_valid());
        assert!(!Bar::new(eurusd(), f64::NAN, 1.2, 1.0, 1.15).is_valid());
    }

    #[test]
    fn test_observe_close_aggregation() {
        let mut bar = Bar::flat(eurusd(), 1.10);
        bar.observe_close(1.12);
        bar.observe_close(1.08);

        assert_relative_eq!(bar.open, 1.10);
        assert_relative_eq!(bar.high, 1.12);
        assert_relative_eq!(bar.low, 1.08);
        assert_relative_eq!(bar.close, 1.08);
    }

    #[test]
    fn test_wicks() {
        let bar = Bar::new(eurusd(), 0.9, 1.0, 0.1, 0.8);
        assert_relative_eq!(bar.range(), 0.9);
        assert_relative_eq!(bar.upper_wick(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(bar.lower_wick(), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_snapshot_rotation() {
        let mut snap = SymbolSnapshot::first(Bar::flat(eurusd(), 1.1));
        assert_eq!(snap.previous, snap.current);

        snap.rotate(Bar::flat(eurusd(), 1.2));
        assert_relative_eq!(snap.previous.close, 1.1);
        assert_relative_eq!(snap.current.close, 1.2);
        assert_relative_eq!(snap.close_diff(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_display_uses_precision() {
        let bar = Bar::flat(Symbol::new("USDJPY").unwrap(), 150.1234);
        assert_eq!(
            bar.to_string(),
            "USDJPY - o: 150.123 h: 150.123 l: 150.123 c: 150.123"
        );
    }
}
