//! Aligned, optionally colored text table.

use std::io::Write;

use colored::{ColoredString, Colorize};

use super::RenderOptions;
use crate::domain::{ProcessSummary, Protocol, UNKNOWN_PID, UNKNOWN_SERVICE};
use crate::error::Result;

const HEADERS: [&str; COLUMNS] = [
    "PID", "PROCESS", "USER", "TYPE", "PROTO", "ADDRESS", "PORT", "REMOTE", "SERVICE", "STATE",
];

const COLUMNS: usize = 10;

/// PID and PORT hold numbers and are right-aligned.
const RIGHT_ALIGNED: [usize; 2] = [0, 6];

const MAX_PROCESS_WIDTH: usize = 30;
const MAX_ADDRESS_WIDTH: usize = 24;

/// Which color a cell gets.
#[derive(Clone, Copy)]
enum Tone {
    Plain,
    Pid,
    Process,
    Protocol(Protocol),
    Port,
    Service { known: bool },
    State,
}

fn paint(text: String, tone: Tone, state: Option<&str>) -> ColoredString {
    match tone {
        Tone::Plain => text.normal(),
        Tone::Pid => text.red(),
        Tone::Process => text.blue().bold(),
        Tone::Protocol(Protocol::Tcp) => text.cyan(),
        Tone::Protocol(Protocol::Udp) => text.magenta(),
        Tone::Port => text.yellow(),
        Tone::Service { known: true } => text.green(),
        Tone::Service { known: false } => text.dimmed(),
        Tone::State => match state {
            Some("LISTEN") => text.green(),
            Some("ESTABLISHED") => text.yellow(),
            _ => text.dimmed(),
        },
    }
}

/// Write the summaries as a table, one row per port.
///
/// Process columns are only filled on the first row of each process.
pub fn render_table<W: Write>(
    summaries: &[ProcessSummary],
    out: &mut W,
    options: &RenderOptions,
) -> Result<()> {
    if summaries.is_empty() {
        writeln!(out, "No open ports found.")?;
        return Ok(());
    }

    let mut rows: Vec<([String; COLUMNS], [Tone; COLUMNS], Option<&str>)> = Vec::new();
    for summary in summaries {
        for (i, entry) in summary.ports.iter().enumerate() {
            let first = i == 0;
            let pid = match (first, summary.process_id) {
                (false, _) => String::new(),
                (true, UNKNOWN_PID) => "-".to_string(),
                (true, pid) => pid.to_string(),
            };
            let process = if first {
                truncate(&summary.process_name, MAX_PROCESS_WIDTH)
            } else {
                String::new()
            };
            let user = if first {
                summary.user.clone().unwrap_or_else(|| "-".to_string())
            } else {
                String::new()
            };

            rows.push((
                [
                    pid,
                    process,
                    user,
                    entry
                        .family
                        .map_or_else(|| "-".to_string(), |f| f.to_string()),
                    entry.protocol.to_string(),
                    truncate(&entry.address, MAX_ADDRESS_WIDTH),
                    entry.port.to_string(),
                    entry.remote.as_ref().map_or_else(
                        || "-".to_string(),
                        |r| truncate(&r.to_string(), MAX_ADDRESS_WIDTH),
                    ),
                    entry.service_name.clone(),
                    entry.state.clone().unwrap_or_else(|| "-".to_string()),
                ],
                [
                    Tone::Pid,
                    Tone::Process,
                    Tone::Plain,
                    Tone::Plain,
                    Tone::Protocol(entry.protocol),
                    Tone::Plain,
                    Tone::Port,
                    Tone::Plain,
                    Tone::Service {
                        known: entry.service_name != UNKNOWN_SERVICE,
                    },
                    Tone::State,
                ],
                entry.state.as_deref(),
            ));
        }
    }

    let mut widths = HEADERS.map(|h| h.chars().count());
    for (cells, _, _) in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    // Header
    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| {
            let cell = format!("{:<w$}", h, w = w);
            if options.color {
                cell.bold().to_string()
            } else {
                cell
            }
        })
        .collect();
    writeln!(out, "{}", header.join("  ").trim_end())?;

    for (cells, tones, state) in &rows {
        let line: Vec<String> = cells
            .iter()
            .zip(tones)
            .zip(widths)
            .enumerate()
            .map(|(col, ((cell, tone), w))| {
                let padded = if RIGHT_ALIGNED.contains(&col) {
                    format!("{:>w$}", cell, w = w)
                } else {
                    format!("{:<w$}", cell, w = w)
                };
                if options.color && !cell.is_empty() {
                    paint(padded, *tone, *state).to_string()
                } else {
                    padded
                }
            })
            .collect();
        writeln!(out, "{}", line.join("  ").trim_end())?;
    }

    let ports: usize = summaries.iter().map(|s| s.ports.len()).sum();
    writeln!(out, "\n{} processes, {} ports", summaries.len(), ports)?;
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max - 1).collect();
        t.push('…');
        t
    }
}
