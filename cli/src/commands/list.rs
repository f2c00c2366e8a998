//! List command - show open ports grouped by process.

use std::io::{self, Write};

use anyhow::Result;
use mesports_core::{
    load_registry, render, Config, RecordFilter, RenderOptions, ReportService, ServiceRegistry,
    SocketSource, SystemSource,
};

pub async fn run(config: &Config, filter: &RecordFilter, options: &RenderOptions) -> Result<()> {
    let registry = load_registry(config).await;
    let source = SystemSource::new(config.source);

    let stdout = io::stdout();
    let stderr = io::stderr();
    list(
        source,
        registry,
        filter,
        options,
        &mut stdout.lock(),
        &mut stderr.lock(),
    )
    .await
}

/// Run the pipeline and write warnings to `err`, then the table to `out`.
///
/// Nothing reaches `out` when enumeration fails.
pub async fn list<S, O, E>(
    source: S,
    registry: ServiceRegistry,
    filter: &RecordFilter,
    options: &RenderOptions,
    out: &mut O,
    err: &mut E,
) -> Result<()>
where
    S: SocketSource,
    O: Write,
    E: Write,
{
    let service = ReportService::new(source, registry);
    let report = service.run(filter).await?;

    for warning in &report.warnings {
        writeln!(err, "warning: {}", warning)?;
    }

    render(&report, out, options)?;
    out.flush()?;
    Ok(())
}
