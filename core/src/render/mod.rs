//! Rendering of process summaries for the terminal.

mod json;
mod table;

use std::io::Write;

use crate::application::Report;
use crate::error::Result;

pub use json::render_json;
pub use table::render_table;

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Rendering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Color protocols, states and headers.
    pub color: bool,
}

/// Write a report in the requested format.
pub fn render<W: Write>(report: &Report, out: &mut W, options: &RenderOptions) -> Result<()> {
    match options.format {
        OutputFormat::Table => render_table(&report.summaries, out, options),
        OutputFormat::Json => render_json(report, out),
    }
}
