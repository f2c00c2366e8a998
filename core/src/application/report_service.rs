//! The collect → parse → enrich pipeline.

use serde::Serialize;

use crate::domain::{aggregate, ProcessSummary, RecordFilter, RegistryOrigin, ServiceRegistry};
use crate::error::Result;
use crate::parser::parse;
use crate::ports::SocketSource;

/// A recoverable problem worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// The facility could not see sockets of other users.
    PermissionLimited { tool: String },
    /// Sockets listed without an owning process.
    UnresolvedOwners { count: usize },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::PermissionLimited { tool } => write!(
                f,
                "{} ran without root privileges; sockets of other users may be missing",
                tool
            ),
            Warning::UnresolvedOwners { count } => write!(
                f,
                "{} socket(s) have no resolvable owner and are listed under <unknown>",
                count
            ),
        }
    }
}

/// Result of one pipeline run, ready for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summaries: Vec<ProcessSummary>,
    #[serde(skip)]
    pub warnings: Vec<Warning>,
    /// Malformed lines passed over by the parser.
    pub skipped_lines: usize,
    /// Where most service names came from.
    pub registry_origin: RegistryOrigin,
}

impl Report {
    /// Total number of port entries over all processes.
    pub fn port_count(&self) -> usize {
        self.summaries.iter().map(|s| s.ports.len()).sum()
    }
}

/// Application service that turns a socket listing into process summaries.
///
/// The registry is owned by the service for the lifetime of the run and
/// lent to the aggregator; nothing is cached beyond that.
pub struct ReportService<S: SocketSource> {
    source: S,
    registry: ServiceRegistry,
}

impl<S: SocketSource> ReportService<S> {
    /// Create a service from a socket source and a loaded registry.
    pub fn new(source: S, registry: ServiceRegistry) -> Self {
        Self { source, registry }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Enumerate, parse, filter and aggregate.
    ///
    /// Fails only when the socket source itself fails.
    pub async fn run(&self, filter: &RecordFilter) -> Result<Report> {
        let listing = self.source.enumerate().await?;

        let mut records = parse(&listing.text, listing.format);
        let kept: Vec<_> = records.by_ref().filter(|r| filter.matches(r)).collect();
        let unresolved = kept.iter().filter(|r| !r.has_owner()).count();

        let skipped_lines = records.skipped();
        if skipped_lines > 0 {
            tracing::debug!(skipped_lines, tool = self.source.name(), "skipped malformed lines");
        }

        let mut warnings = Vec::new();
        if listing.permission_limited {
            warnings.push(Warning::PermissionLimited {
                tool: self.source.name().to_string(),
            });
        }
        if unresolved > 0 {
            warnings.push(Warning::UnresolvedOwners { count: unresolved });
        }

        let summaries = aggregate(kept, &self.registry);
        tracing::debug!(processes = summaries.len(), "aggregated socket listing");

        Ok(Report {
            summaries,
            warnings,
            skipped_lines,
            registry_origin: self.registry.origin(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Protocol, UNKNOWN_PROCESS};
    use crate::error::Error;
    use crate::parser::LineFormat;
    use crate::ports::RawListing;

    /// Mock source for testing.
    struct MockSource {
        text: &'static str,
        permission_limited: bool,
    }

    impl SocketSource for MockSource {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn enumerate(&self) -> Result<RawListing> {
            Ok(RawListing {
                text: self.text.to_string(),
                format: LineFormat::Lsof,
                permission_limited: self.permission_limited,
            })
        }
    }

    struct SsListing(&'static str);

    impl SocketSource for SsListing {
        fn name(&self) -> &'static str {
            "ss"
        }

        async fn enumerate(&self) -> Result<RawListing> {
            Ok(RawListing {
                text: self.0.to_string(),
                format: LineFormat::Ss,
                permission_limited: false,
            })
        }
    }

    struct MissingSource;

    impl SocketSource for MissingSource {
        fn name(&self) -> &'static str {
            "missing"
        }

        async fn enumerate(&self) -> Result<RawListing> {
            Err(Error::ToolUnavailable {
                tool: "missing".to_string(),
                reason: "not found on PATH".to_string(),
            })
        }
    }

    const LISTING: &str = r#"COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
nginx      123  root    6u  IPv4 0x1234567890abcdef      0t0  TCP *:443 (LISTEN)
nginx      123  root    7u  IPv4 0x1234567890abcdf0      0t0  TCP *:80 (LISTEN)
curl       900  me      5u  IPv4 0x1234567890abcdf1      0t0  TCP 10.0.0.5:50000->1.1.1.1:443 (ESTABLISHED)
garbage
"#;

    #[tokio::test]
    async fn test_run_builds_summaries() {
        let service = ReportService::new(
            MockSource {
                text: LISTING,
                permission_limited: false,
            },
            ServiceRegistry::builtin(),
        );
        let report = service.run(&RecordFilter::new()).await.unwrap();

        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.summaries[0].process_name, "nginx");
        assert_eq!(report.summaries[0].ports[0].service_name, "https");
        assert_eq!(report.summaries[0].ports[1].service_name, "http");
        assert_eq!(report.port_count(), 3);
        assert_eq!(report.skipped_lines, 1);
        assert!(report.warnings.is_empty());
        assert_eq!(report.registry_origin, RegistryOrigin::Builtin);
    }

    #[tokio::test]
    async fn test_run_applies_filter() {
        let service = ReportService::new(
            MockSource {
                text: LISTING,
                permission_limited: false,
            },
            ServiceRegistry::builtin(),
        );
        let filter = RecordFilter::new()
            .with_listening_only(true)
            .with_protocol(Some(Protocol::Tcp));
        let report = service.run(&filter).await.unwrap();

        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].process_id, 123);
    }

    #[tokio::test]
    async fn test_permission_warning() {
        let service = ReportService::new(
            MockSource {
                text: LISTING,
                permission_limited: true,
            },
            ServiceRegistry::builtin(),
        );
        let report = service.run(&RecordFilter::new()).await.unwrap();

        assert_eq!(
            report.warnings,
            vec![Warning::PermissionLimited {
                tool: "mock".to_string()
            }]
        );
        // Still produces the table data
        assert_eq!(report.summaries.len(), 2);
    }

    const SS_LISTING: &str = r#"udp UNCONN 0 0 0.0.0.0:5353 0.0.0.0:*
tcp LISTEN 0 511 0.0.0.0:80 0.0.0.0:* users:(("nginx",pid=900,fd=6))
"#;

    #[tokio::test]
    async fn test_unresolved_owners_warning() {
        let service = ReportService::new(SsListing(SS_LISTING), ServiceRegistry::builtin());
        let report = service.run(&RecordFilter::new()).await.unwrap();

        assert_eq!(report.warnings, vec![Warning::UnresolvedOwners { count: 1 }]);
        assert_eq!(report.summaries[0].process_name, UNKNOWN_PROCESS);
        assert_eq!(report.summaries[0].ports[0].port, 5353);
        assert_eq!(report.summaries[1].process_name, "nginx");
    }

    #[tokio::test]
    async fn test_filtered_out_owners_are_not_counted() {
        let service = ReportService::new(SsListing(SS_LISTING), ServiceRegistry::builtin());
        let filter = RecordFilter::new().with_protocol(Some(Protocol::Tcp));
        let report = service.run(&filter).await.unwrap();

        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].process_name, "nginx");
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_tool_unavailable_propagates() {
        let service = ReportService::new(MissingSource, ServiceRegistry::builtin());
        let result = service.run(&RecordFilter::new()).await;
        assert!(matches!(result, Err(Error::ToolUnavailable { .. })));
    }
}
