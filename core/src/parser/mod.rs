//! Record parser - turns raw socket listings into connection records.
//!
//! Parsing is lazy: [`parse`] returns an iterator that reads one line at a
//! time. Header lines and blank lines are dropped silently. Malformed lines
//! are skipped and counted; they never abort the listing.

mod address;
mod lsof;
mod ss;

use std::str::Lines;

use serde::{Deserialize, Serialize};

use crate::domain::ConnectionRecord;

pub use address::{parse_endpoint, Endpoint};

/// Textual layout of a socket listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineFormat {
    /// `lsof -i -n -P` columns.
    Lsof,
    /// `ss -H -t -u -a -n -p` columns.
    Ss,
}

/// What a single line of a listing turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Record(ConnectionRecord),
    Header,
    Blank,
    Malformed,
}

impl LineFormat {
    /// Classify one line of output.
    pub fn parse_line(&self, line: &str) -> LineOutcome {
        match self {
            LineFormat::Lsof => lsof::parse_line(line),
            LineFormat::Ss => ss::parse_line(line),
        }
    }
}

/// Lazy iterator over the records of a listing, in input order.
pub struct Records<'a> {
    lines: Lines<'a>,
    format: LineFormat,
    skipped: usize,
}

impl<'a> Records<'a> {
    /// Number of malformed lines passed over so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for Records<'_> {
    type Item = ConnectionRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            match self.format.parse_line(line) {
                LineOutcome::Record(record) => return Some(record),
                LineOutcome::Malformed => {
                    tracing::trace!(line, "skipping malformed line");
                    self.skipped += 1;
                }
                LineOutcome::Header | LineOutcome::Blank => {}
            }
        }
        None
    }
}

/// Parse a raw listing in the given format.
pub fn parse(raw: &str, format: LineFormat) -> Records<'_> {
    Records {
        lines: raw.lines(),
        format,
        skipped: 0,
    }
}
