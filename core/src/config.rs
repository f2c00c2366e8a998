//! Runtime configuration.
//!
//! Settings are read (never written) from `~/.mesports/config.json` when that
//! file exists. Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::Protocol;
use crate::error::{Error, Result};

/// Default location of the IANA service-name and port-number registry.
pub const IANA_CSV_URL: &str =
    "https://www.iana.org/assignments/service-names-port-numbers/service-names-port-numbers.csv";

/// Which OS facility enumerates sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Lsof,
    Ss,
}

impl SourceKind {
    /// The facility used when nothing is configured.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "linux") {
            SourceKind::Ss
        } else {
            SourceKind::Lsof
        }
    }
}

impl Default for SourceKind {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// URL of the IANA CSV registry.
    #[serde(default = "default_registry_url", rename = "registryUrl")]
    pub registry_url: String,

    /// Timeout for the registry fetch in seconds.
    #[serde(default = "default_fetch_timeout", rename = "fetchTimeoutSecs")]
    pub fetch_timeout_secs: u64,

    /// Skip the network and use local service data only.
    #[serde(default)]
    pub offline: bool,

    /// Path of the system services database consulted when the fetch fails.
    #[serde(default = "default_services_path", rename = "servicesPath")]
    pub services_path: PathBuf,

    /// Socket listing facility.
    #[serde(default)]
    pub source: SourceKind,

    /// Colorize the table. `None` means "when stdout is a terminal".
    #[serde(default)]
    pub color: Option<bool>,

    /// Only keep listening TCP sockets and UDP sockets.
    #[serde(default, rename = "listeningOnly")]
    pub listening_only: bool,

    /// Restrict the listing to one transport protocol.
    #[serde(default)]
    pub protocol: Option<Protocol>,
}

fn default_registry_url() -> String {
    IANA_CSV_URL.to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_services_path() -> PathBuf {
    PathBuf::from("/etc/services")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            fetch_timeout_secs: default_fetch_timeout(),
            offline: false,
            services_path: default_services_path(),
            source: SourceKind::default(),
            color: None,
            listening_only: false,
            protocol: None,
        }
    }
}

impl Config {
    /// Default path: `~/.mesports/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".mesports").join("config.json"))
    }

    /// Load configuration from the default path.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load configuration from a custom path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_nonexistent() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.registry_url, IANA_CSV_URL);
        assert_eq!(config.fetch_timeout_secs, 10);
    }

    #[test]
    fn test_load_partial() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"offline": true, "source": "lsof", "protocol": "udp", "fetchTimeoutSecs": 3}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.offline);
        assert_eq!(config.source, SourceKind::Lsof);
        assert_eq!(config.protocol, Some(Protocol::Udp));
        assert_eq!(config.fetch_timeout_secs, 3);
        assert_eq!(config.registry_url, IANA_CSV_URL);
    }

    #[test]
    fn test_load_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
