//! HTTP client for the price provider.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use fxalert_types::{Bar, Symbol};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::{FetchError, QuoteFetcher, parse_quote, strip_jsonp, url};

/// Configuration for the provider client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Provider base URL.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Idle connections kept per host.
    pub max_idle_per_host: usize,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: url::BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
            max_idle_per_host: 4,
            // The provider rejects non-browser agents.
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Price provider client with connection pooling.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Client,
    config: ClientConfig,
}

impl ProviderClient {
    /// Creates a new provider client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl QuoteFetcher for ProviderClient {
    async fn fetch(&self, symbol: &Symbol, day: NaiveDate) -> Result<Bar, FetchError> {
        let callback = format!("jsonp{}", Utc::now().timestamp());
        let url = url::quote_url(&self.config.base_url, symbol, day, &callback);
        debug!(%symbol, %day, %url, "fetching quote");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        parse_quote(symbol, strip_jsonp(&body, &callback))
    }
}
