//! Registry fetcher port (interface).

use crate::error::Result;

/// Port for retrieving the IANA service-name registry document.
pub trait RegistryFetcher: Send + Sync {
    /// Fetch the registry CSV as text.
    fn fetch(&self) -> impl std::future::Future<Output = Result<String>> + Send;
}
