//! Quote command implementation.

use anyhow::{Context, Result};
use fxalert_fetch::QuoteFetcher;
use fxalert_patterns::classify;
use fxalert_symbols::SymbolRegistry;
use std::time::Duration;

use super::provider_client;

/// Fetch today's bar for one symbol and print it with its pattern, if any.
pub(crate) async fn show_quote(symbol: &str, provider_url: &str, timeout: Duration) -> Result<()> {
    let symbol = SymbolRegistry::global()
        .get(symbol)
        .with_context(|| format!("Unknown symbol: {symbol}"))?;
    let client = provider_client(provider_url, timeout)?;

    let today = chrono::Utc::now().date_naive();
    let bar = client
        .fetch(symbol, today)
        .await
        .with_context(|| format!("Failed to fetch {symbol} for {today}"))?;

    println!("{bar}");
    match classify(&bar) {
        Some(pattern) => println!("Pattern: {pattern}"),
        None => println!("Pattern: none"),
    }
    Ok(())
}
