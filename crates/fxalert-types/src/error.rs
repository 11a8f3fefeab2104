//! Error types for fxalert.

use thiserror::Error;

/// Result type alias for quote reads.
pub type Result<T> = std::result::Result<T, QuoteError>;

/// Errors returned when reading quotes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// The symbol is outside the configured universe.
    #[error("Symbol not allowed: {0}")]
    NotAllowed(String),

    /// The symbol is allowed but nothing has been fetched for it yet.
    #[error("No quote for {0}")]
    NoQuote(String),
}

impl QuoteError {
    /// Returns true if the error may resolve on a later update.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NoQuote(_))
    }
}

/// Error for malformed ticker symbols.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// The symbol was empty after trimming.
    #[error("Empty symbol")]
    Empty,

    /// The symbol contains characters other than ASCII letters and digits.
    #[error("Invalid symbol '{0}'")]
    InvalidCharacters(String),
}

/// Error returned when parsing an invalid comparison direction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid direction '{0}', expected '<' or '>'")]
pub struct DirectionParseError(pub String);
