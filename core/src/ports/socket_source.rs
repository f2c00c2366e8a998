//! Socket source port (interface).

use crate::error::Result;
use crate::parser::LineFormat;

/// Raw output of a socket listing facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListing {
    /// Text as printed by the facility.
    pub text: String,
    /// Layout of `text`.
    pub format: LineFormat,
    /// Set when the facility could not see every socket owner.
    pub permission_limited: bool,
}

/// Port for enumerating sockets with their owning processes.
///
/// Implementations wrap one platform facility (lsof, ss, ...) and hand back
/// its output untouched; parsing is not their concern.
pub trait SocketSource: Send + Sync {
    /// Name of the underlying facility, for diagnostics.
    fn name(&self) -> &'static str;

    /// List listening and connected sockets.
    ///
    /// Fails with `Error::ToolUnavailable` when the facility is missing.
    fn enumerate(&self) -> impl std::future::Future<Output = Result<RawListing>> + Send;
}
