//! Domain layer - Pure data models and logic.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod connection;
mod registry;
mod summary;

pub use connection::{
    AddressFamily, ConnectionRecord, Protocol, RemoteEndpoint, UNKNOWN_PID, UNKNOWN_PROCESS,
};
pub use registry::{RegistryOrigin, ServiceRegistry, UNKNOWN_SERVICE};
pub use summary::{aggregate, dedup_records, PortEntry, ProcessSummary, RecordFilter};
