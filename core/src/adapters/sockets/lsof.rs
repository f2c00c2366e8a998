//! Socket listing through `lsof`.

use super::command::{is_privileged, run};
use crate::error::{Error, Result};
use crate::parser::LineFormat;
use crate::ports::{RawListing, SocketSource};

/// Socket source backed by `lsof`, available on macOS and most unix systems.
pub struct LsofSource;

impl LsofSource {
    /// Create a new lsof source.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LsofSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SocketSource for LsofSource {
    fn name(&self) -> &'static str {
        "lsof"
    }

    /// List all internet sockets using lsof.
    ///
    /// Executes: `lsof -i -n -P +c 0`
    ///
    /// Flags explained:
    /// - -i: Show internet sockets (TCP and UDP, any state)
    /// - -n: Show IP addresses (don't resolve to hostnames)
    /// - -P: Show port numbers (don't resolve to service names)
    /// - +c 0: Show full command name (unlimited length)
    async fn enumerate(&self) -> Result<RawListing> {
        let output = run(self.name(), &["-i", "-n", "-P", "+c", "0"]).await?;

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            tracing::debug!(status = ?output.status, stderr = %stderr.trim(), "lsof exited unsuccessfully");
        }
        check_exit(output.status.code(), &text, &stderr)?;

        let permission_limited = !is_privileged() || stderr.contains("Permission denied");

        Ok(RawListing {
            text,
            format: LineFormat::Lsof,
            permission_limited,
        })
    }
}

/// Judge an lsof exit status.
///
/// lsof exits 1 both when nothing matched and when some files could not be
/// examined; either way the listing on stdout stands. Any other status, or an
/// empty listing with real errors on stderr, is a failure.
fn check_exit(code: Option<i32>, stdout: &str, stderr: &str) -> Result<()> {
    let diagnostic = stderr.lines().map(str::trim).find(|line| !is_noise(line));

    match (code, diagnostic) {
        (Some(0), _) => Ok(()),
        (Some(1), _) if !stdout.trim().is_empty() => Ok(()),
        (Some(1), None) => Ok(()),
        (code, diagnostic) => {
            let status = code.map_or_else(|| "a signal".to_string(), |c| format!("status {}", c));
            Err(Error::CommandFailed(format!(
                "lsof exited with {}: {}",
                status,
                diagnostic.unwrap_or("no diagnostic")
            )))
        }
    }
}

/// Stderr lines lsof prints during an otherwise usable run.
fn is_noise(line: &str) -> bool {
    line.is_empty() || line.contains("WARNING") || line.contains("Permission denied")
}
