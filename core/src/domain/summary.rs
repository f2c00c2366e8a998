//! Per-process aggregation of connection records.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{AddressFamily, ConnectionRecord, Protocol, RemoteEndpoint, ServiceRegistry};

// ============================================================================
// ProcessSummary
// ============================================================================

/// A distinct (port, protocol) held by a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortEntry {
    pub port: u16,
    pub protocol: Protocol,
    /// Registered service name, `"unknown"` when absent from the registry.
    pub service_name: String,
    /// State of the first socket seen on this pair.
    pub state: Option<String>,
    /// Local address of the first socket seen on this pair.
    pub address: String,
    pub family: Option<AddressFamily>,
    /// Peer of the first socket seen on this pair, when connected.
    pub remote: Option<RemoteEndpoint>,
}

/// All ports held by one process, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSummary {
    pub process_id: u32,
    pub process_name: String,
    pub user: Option<String>,
    pub ports: Vec<PortEntry>,
}

impl ProcessSummary {
    fn new(record: &ConnectionRecord) -> Self {
        Self {
            process_id: record.process_id,
            process_name: record.process_name.clone(),
            user: record.user.clone(),
            ports: Vec::new(),
        }
    }
}

/// Group records by process id and attach service names.
///
/// Processes appear in the order their first record appears; so do the ports
/// within each process. Repeated (port, protocol) pairs for the same process
/// collapse into the first one.
pub fn aggregate<I>(records: I, registry: &ServiceRegistry) -> Vec<ProcessSummary>
where
    I: IntoIterator<Item = ConnectionRecord>,
{
    let mut summaries: Vec<ProcessSummary> = Vec::new();
    let mut index: HashMap<u32, usize> = HashMap::new();
    let mut seen: HashSet<(u32, u16, Protocol)> = HashSet::new();

    for record in records {
        let slot = *index.entry(record.process_id).or_insert_with(|| {
            summaries.push(ProcessSummary::new(&record));
            summaries.len() - 1
        });

        if !seen.insert((record.process_id, record.local_port, record.protocol)) {
            continue;
        }

        let summary = &mut summaries[slot];
        if summary.user.is_none() {
            summary.user = record.user.clone();
        }
        summary.ports.push(PortEntry {
            port: record.local_port,
            protocol: record.protocol,
            service_name: registry
                .service_name(record.local_port, record.protocol)
                .to_string(),
            state: record.state,
            address: record.local_address,
            family: record.family,
            remote: record.remote,
        });
    }

    summaries
}

/// Drop records that repeat a (process, port, protocol) already seen.
pub fn dedup_records<I>(records: I) -> Vec<ConnectionRecord>
where
    I: IntoIterator<Item = ConnectionRecord>,
{
    let mut seen: HashSet<(u32, u16, Protocol)> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert((r.process_id, r.local_port, r.protocol)))
        .collect()
}

// ============================================================================
// RecordFilter
// ============================================================================

/// Filter criteria applied to records before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilter {
    /// Only keep listening TCP sockets and UDP sockets.
    #[serde(default)]
    pub listening_only: bool,
    /// Only keep one transport protocol.
    #[serde(default)]
    pub protocol: Option<Protocol>,
    /// Only keep one local port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Case-insensitive substring of the process name.
    #[serde(default)]
    pub name: Option<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a record matches all filter criteria.
    pub fn matches(&self, record: &ConnectionRecord) -> bool {
        if self.listening_only && !record.is_listening() {
            return false;
        }
        if let Some(protocol) = self.protocol {
            if record.protocol != protocol {
                return false;
            }
        }
        if let Some(port) = self.port {
            if record.local_port != port {
                return false;
            }
        }
        if let Some(ref name) = self.name {
            if !record
                .process_name
                .to_lowercase()
                .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        true
    }

    pub fn with_listening_only(mut self, enabled: bool) -> Self {
        self.listening_only = enabled;
        self
    }

    pub fn with_protocol(mut self, protocol: Option<Protocol>) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }
}
