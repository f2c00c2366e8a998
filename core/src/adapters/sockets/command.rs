//! Running a listing facility as a subprocess.

use std::io::ErrorKind;
use std::process::{Output, Stdio};

use tokio::process::Command;

use crate::error::{Error, Result};

/// Run `tool` from `PATH` and capture its output.
///
/// A missing executable maps to `Error::ToolUnavailable`; exit status is left
/// for the caller to judge since listing tools use it loosely.
pub(super) async fn run(tool: &str, args: &[&str]) -> Result<Output> {
    tracing::debug!(tool, ?args, "running socket listing");

    Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ToolUnavailable {
                tool: tool.to_string(),
                reason: "not found on PATH".to_string(),
            },
            _ => Error::CommandFailed(format!("Failed to run {}: {}", tool, e)),
        })
}

/// Whether the process runs with root privileges.
pub(super) fn is_privileged() -> bool {
    #[cfg(unix)]
    {
        nix::unistd::geteuid().is_root()
    }

    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool() {
        let result = run("mesports-no-such-listing-tool", &[]).await;
        assert!(matches!(result, Err(Error::ToolUnavailable { .. })));
    }
}
