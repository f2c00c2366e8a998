//! Socket listing through `ss` (Linux).

use super::command::{is_privileged, run};
use crate::error::{Error, Result};
use crate::parser::LineFormat;
use crate::ports::{RawListing, SocketSource};

/// Linux socket source backed by iproute2's `ss`.
pub struct SsSource;

impl SsSource {
    /// Create a new ss source.
    pub fn new() -> Self {
        Self
    }
}

impl Default for SsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SocketSource for SsSource {
    fn name(&self) -> &'static str {
        "ss"
    }

    /// List TCP and UDP sockets.
    ///
    /// Executes: `ss -H -t -u -a -n -p`
    ///
    /// Flags explained:
    /// -H, --no-header     Suppress header line
    /// -t, --tcp           display TCP sockets
    /// -u, --udp           display UDP sockets
    /// -a, --all           display listening and non-listening sockets
    /// -n, --numeric       don't resolve service names
    /// -p, --processes     show process using socket
    async fn enumerate(&self) -> Result<RawListing> {
        let output = run(self.name(), &["-H", "-t", "-u", "-a", "-n", "-p"]).await?;

        if !output.status.success() {
            return Err(Error::CommandFailed(format!(
                "ss exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(RawListing {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
            format: LineFormat::Ss,
            permission_limited: !is_privileged(),
        })
    }
}
