//! Service registry loading with fallbacks.

use std::path::PathBuf;

use crate::adapters::HttpFetcher;
use crate::config::Config;
use crate::domain::ServiceRegistry;
use crate::error::Result;
use crate::ports::RegistryFetcher;

/// Loads the service registry from the best available source.
///
/// Order: the fetcher (IANA CSV), then the services file, then the built-in
/// table. Built-in entries always fill the gaps of whichever source wins, so
/// the result is never empty.
pub struct RegistryLoader<F: RegistryFetcher> {
    fetcher: Option<F>,
    services_path: Option<PathBuf>,
}

impl<F: RegistryFetcher> RegistryLoader<F> {
    /// Create a loader. `None` skips that source.
    pub fn new(fetcher: Option<F>, services_path: Option<PathBuf>) -> Self {
        Self {
            fetcher,
            services_path,
        }
    }

    /// Load the registry. Never fails.
    pub async fn load(&self) -> ServiceRegistry {
        let mut registry = match self.load_primary().await {
            Some(registry) => registry,
            None => ServiceRegistry::builtin(),
        };

        registry.fill_missing(&ServiceRegistry::builtin());
        tracing::debug!(origin = %registry.origin(), entries = registry.len(), "service registry ready");
        registry
    }

    async fn load_primary(&self) -> Option<ServiceRegistry> {
        if let Some(fetcher) = &self.fetcher {
            match self.fetch_iana(fetcher).await {
                Ok(registry) => return Some(registry),
                Err(e) => tracing::warn!("{}, falling back to local service data", e),
            }
        }

        let path = self.services_path.as_ref()?;
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let registry = ServiceRegistry::from_services(&content);
                if registry.is_empty() {
                    tracing::debug!(path = %path.display(), "services file has no entries");
                    None
                } else {
                    Some(registry)
                }
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "services file unreadable");
                None
            }
        }
    }

    async fn fetch_iana(&self, fetcher: &F) -> Result<ServiceRegistry> {
        let content = fetcher.fetch().await?;
        ServiceRegistry::from_iana_csv(&content)
    }
}

/// Load the registry the way `config` asks for.
///
/// Offline mode, or an HTTP client that cannot be built, skips the network.
pub async fn load_registry(config: &Config) -> ServiceRegistry {
    let fetcher = if config.offline {
        None
    } else {
        match HttpFetcher::from_config(config) {
            Ok(fetcher) => Some(fetcher),
            Err(e) => {
                tracing::warn!("{}, skipping the network", e);
                None
            }
        }
    };

    RegistryLoader::new(fetcher, Some(config.services_path.clone()))
        .load()
        .await
}
