//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

pub mod registry;
pub mod sockets;

// Re-export main types for convenience
pub use registry::HttpFetcher;
pub use sockets::{LsofSource, SsSource, SystemSource};
