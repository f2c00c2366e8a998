//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod registry_fetcher;
mod socket_source;

pub use registry_fetcher::RegistryFetcher;
pub use socket_source::{RawListing, SocketSource};
