//! Error types for the mesports-core library.

use thiserror::Error;

/// Result type alias for mesports operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while enumerating, enriching and rendering sockets.
///
/// `RegistryUnavailable` is recovered inside the registry loader; the rest
/// reach the binary and end the run.
#[derive(Error, Debug)]
pub enum Error {
    /// The socket listing facility is not installed or not on `PATH`.
    #[error("{tool} is not available: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// The service registry could not be fetched or parsed.
    #[error("Service registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::RegistryUnavailable(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::RegistryUnavailable(format!("malformed registry CSV: {}", e))
    }
}
