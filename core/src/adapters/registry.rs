//! HTTP adapter for the IANA registry.

use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ports::RegistryFetcher;

/// Fetches the registry CSV over HTTPS.
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    /// Create a fetcher for `url` with a request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mesports/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Create a fetcher from the registry settings of `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.registry_url.clone(),
            Duration::from_secs(config.fetch_timeout_secs),
        )
    }
}

impl RegistryFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<String> {
        tracing::debug!(url = %self.url, "fetching service registry");

        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(Error::RegistryUnavailable(format!(
                "{} returned {}",
                self.url,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}
