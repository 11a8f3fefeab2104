//! Allowed symbol universe for the fxalert quote alert bot.
//!
//! The universe is fixed at process start and shared by the quote holder,
//! the command parser and the alert evaluator.
//!
//! # Example
//!
//! ```
//! use fxalert_symbols::SymbolRegistry;
//!
//! let registry = SymbolRegistry::global();
//! assert!(registry.contains("eurusd"));
//! assert!(!registry.contains("XAUUSD"));
//! ```

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::sync::OnceLock;

use fxalert_types::Symbol;

/// Tickers quoted by the price provider.
const ALLOWED_SYMBOLS: &[&str] = &[
    "AUDCAD", "AUDCHF", "AUDJPY", "AUDNZD", "AUDUSD", "CADCHF", "CADJPY", "CHFJPY", "EURAUD",
    "EURCAD", "EURCHF", "EURGBP", "EURJPY", "EURNZD", "EURUSD", "GBPAUD", "GBPCAD", "GBPCHF",
    "GBPJPY", "GBPNZD", "GBPUSD", "NZDCAD", "NZDCHF", "NZDJPY", "NZDUSD", "USDCAD", "USDCHF",
    "USDJPY", "BTCUSD",
];

/// Global registry instance.
static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();

/// Registry of the symbols fxalert is allowed to quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRegistry {
    symbols: BTreeSet<Symbol>,
}

impl SymbolRegistry {
    /// Returns the global registry of provider symbols.
    ///
    /// The registry is initialized lazily on first access.
    #[must_use]
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(|| {
            Self::from_symbols(ALLOWED_SYMBOLS.iter().filter_map(|s| Symbol::new(s).ok()))
        })
    }

    /// Creates a registry from an explicit symbol list.
    #[must_use]
    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
        }
    }

    /// Looks up a symbol by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        let symbol = Symbol::new(name).ok()?;
        self.symbols.get(&symbol)
    }

    /// Returns true if the symbol is part of the universe.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns all symbols in alphabetical order.
    pub fn all(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Returns symbols whose name contains `pattern` (case-insensitive).
    ///
    /// An empty pattern or `*` matches everything.
    pub fn matching<'a>(&'a self, pattern: &str) -> impl Iterator<Item = &'a Symbol> + 'a {
        let pattern = pattern.trim().to_ascii_uppercase();
        let any = pattern.is_empty() || pattern == "*";
        self.symbols
            .iter()
            .filter(move |s| any || s.as_str().contains(&pattern))
    }

    /// Returns the number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_registry() {
        let registry = SymbolRegistry::global();
        assert_eq!(registry.len(), ALLOWED_SYMBOLS.len());
        assert!(registry.contains("BTCUSD"));
        assert!(registry.contains("usdjpy"));
        assert!(!registry.contains("XAUUSD"));
        assert!(!registry.contains(""));
    }

    #[test]
    fn test_matching() {
        let registry = SymbolRegistry::global();
        let jpy: Vec<_> = registry.matching("jpy").collect();
        assert_eq!(jpy.len(), 7);
        assert!(jpy.iter().all(|s| s.as_str().contains("JPY")));
        assert_eq!(registry.matching("*").count(), registry.len());
        assert_eq!(registry.matching("").count(), registry.len());
    }

    #[test]
    fn test_from_symbols() {
        let registry = SymbolRegistry::from_symbols([
            Symbol::new("eurusd").unwrap(),
            Symbol::new("EURUSD").unwrap(),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("EurUsd").unwrap().as_str(), "EURUSD");
    }
}
