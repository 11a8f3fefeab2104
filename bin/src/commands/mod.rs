//! Command implementations for the fxalert CLI.

pub(crate) mod quote;
pub(crate) mod run;
pub(crate) mod symbols;

use anyhow::{Context, Result};
use fxalert_fetch::{ClientConfig, ProviderClient};
use std::time::Duration;

/// Builds the price provider client.
pub(crate) fn provider_client(base_url: &str, timeout: Duration) -> Result<ProviderClient> {
    let config = ClientConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        timeout,
        ..Default::default()
    };
    ProviderClient::new(config).context("Failed to build price provider client")
}
