//! Price provider client for the fxalert quote alert bot.
//!
//! - [`QuoteFetcher`] - Fetches one daily bar for one symbol
//! - [`ProviderClient`] - HTTP implementation with a pooled client
//! - [`url::quote_url`] - Constructs provider URLs
//! - [`parse_quote`] - Decodes the provider's JSONP envelope

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod parse;
pub mod url;

use async_trait::async_trait;
use chrono::NaiveDate;
use fxalert_types::{Bar, Symbol};

pub use client::{ClientConfig, ProviderClient};
pub use error::FetchError;
pub use parse::{parse_quote, strip_jsonp};

/// Fetches a single daily bar for a symbol.
///
/// Implementations must be safe to call concurrently for different symbols
/// and must never return a partially valid bar.
#[async_trait]
pub trait QuoteFetcher: Send + Sync + std::fmt::Debug {
    /// Fetches the bar for `symbol` on `day`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, a
    /// malformed or empty payload, or an invalid bar.
    async fn fetch(&self, symbol: &Symbol, day: NaiveDate) -> Result<Bar, FetchError>;
}
