//! Socket source adapters.
//!
//! One implementation per platform facility, selected at runtime.

mod command;
mod lsof;
mod ss;

pub use lsof::LsofSource;
pub use ss::SsSource;

use crate::config::SourceKind;
use crate::error::Result;
use crate::ports::{RawListing, SocketSource};

/// The socket source chosen by configuration.
pub enum SystemSource {
    Lsof(LsofSource),
    Ss(SsSource),
}

impl SystemSource {
    /// Create the source for the given facility.
    pub fn new(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Lsof => SystemSource::Lsof(LsofSource::new()),
            SourceKind::Ss => SystemSource::Ss(SsSource::new()),
        }
    }
}

impl Default for SystemSource {
    fn default() -> Self {
        Self::new(SourceKind::platform_default())
    }
}

impl SocketSource for SystemSource {
    fn name(&self) -> &'static str {
        match self {
            SystemSource::Lsof(s) => s.name(),
            SystemSource::Ss(s) => s.name(),
        }
    }

    async fn enumerate(&self) -> Result<RawListing> {
        match self {
            SystemSource::Lsof(s) => s.enumerate().await,
            SystemSource::Ss(s) => s.enumerate().await,
        }
    }
}
