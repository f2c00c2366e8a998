//! mesports core library
//!
//! Lists open network ports on the local host together with their IANA
//! service names and owning processes.
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models and aggregation
//! - `parser`: Socket listing parsers
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//! - `render`: Table and JSON output
//!
//! # Platform Support
//! - macOS and other unix: `lsof`
//! - Linux: `ss` (or `lsof` when configured)

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod parser;
pub mod ports;
pub mod render;

// Re-export domain types (primary API)
pub use domain::{
    aggregate, AddressFamily, ConnectionRecord, PortEntry, ProcessSummary, Protocol,
    RecordFilter, RegistryOrigin, RemoteEndpoint, ServiceRegistry,
};

// Re-export other commonly used types
pub use adapters::{HttpFetcher, LsofSource, SsSource, SystemSource};
pub use application::{load_registry, RegistryLoader, Report, ReportService, Warning};
pub use config::{Config, SourceKind};
pub use error::{Error, Result};
pub use parser::{parse, LineFormat, Records};
pub use ports::{RawListing, RegistryFetcher, SocketSource};
pub use render::{render, OutputFormat, RenderOptions};
