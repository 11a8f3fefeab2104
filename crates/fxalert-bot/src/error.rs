//! Error types for the chat bot.

use fxalert_store::StoreError;
use fxalert_types::{DirectionParseError, QuoteError, SymbolError};
use thiserror::Error;

/// Errors from parsing a chat command.
///
/// These are never fatal; the user gets the help text instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The message is not a known command.
    #[error("Unsupported command: {0}")]
    UnknownCommand(String),

    /// The command has the wrong number of arguments.
    #[error("Unsupported command format, expected: {0}")]
    Format(&'static str),

    /// The symbol argument is malformed.
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    /// The comparison argument is neither `<` nor `>`.
    #[error(transparent)]
    Direction(#[from] DirectionParseError),

    /// The price argument is not a positive decimal number.
    #[error("Can't parse price: {0}")]
    Price(String),

    /// The delta argument is not a positive integer.
    #[error("Can't parse delta points: {0}")]
    Points(String),
}

/// Errors from the chat API.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request failed or timed out.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body is not the expected JSON.
    #[error("Can't decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API answered with `ok: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Errors from handling a parsed command.
#[derive(Error, Debug)]
pub enum BotError {
    /// Persisting the change failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Reading a quote failed.
    #[error(transparent)]
    Quote(#[from] QuoteError),
}

/// Result type for command handling.
pub type Result<T> = std::result::Result<T, BotError>;
