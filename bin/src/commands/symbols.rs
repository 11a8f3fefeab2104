//! Symbols command implementation.

use anyhow::Result;
use fxalert_symbols::SymbolRegistry;

/// List the quotable symbols, optionally filtered by substring.
pub(crate) fn list_symbols(filter: Option<&str>) -> Result<()> {
    let registry = SymbolRegistry::global();
    let symbols: Vec<_> = registry.matching(filter.unwrap_or_default()).collect();

    if symbols.is_empty() {
        println!("No symbols found.");
        return Ok(());
    }

    println!("{:<10} {:<10} {:<8}", "SYMBOL", "PRECISION", "KIND");
    println!("{}", "-".repeat(30));

    for symbol in &symbols {
        let kind = if symbol.is_crypto() { "crypto" } else { "forex" };
        println!("{:<10} {:<10} {:<8}", symbol, symbol.precision(), kind);
    }

    println!("\nTotal: {} symbols", symbols.len());
    Ok(())
}
