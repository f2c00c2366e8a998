//! Application layer - Use case services.
//!
//! This module contains application services that orchestrate
//! domain logic and adapter interactions.
//!
//! Services are designed to be thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod registry_loader;
mod report_service;

pub use registry_loader::{load_registry, RegistryLoader};
pub use report_service::{Report, ReportService, Warning};
