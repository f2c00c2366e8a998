//! JSON rendering.

use std::io::Write;

use crate::application::Report;
use crate::error::Result;

/// Write the report as pretty-printed JSON followed by a newline.
pub fn render_json<W: Write>(report: &Report, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
