//! Port to service-name registry.
//!
//! The registry is built once per run from one of three sources, in order of
//! preference: the IANA CSV, the system services database, the built-in table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Protocol;
use crate::error::{Error, Result};

/// Name rendered for ports missing from the registry.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Where the bulk of the registry entries came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistryOrigin {
    Iana,
    SystemServices,
    Builtin,
}

impl std::fmt::Display for RegistryOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryOrigin::Iana => write!(f, "IANA registry"),
            RegistryOrigin::SystemServices => write!(f, "system services database"),
            RegistryOrigin::Builtin => write!(f, "built-in table"),
        }
    }
}

/// Well-known ports shipped with the binary.
const BUILTIN: &[(u16, Protocol, &str)] = &[
    (20, Protocol::Tcp, "ftp-data"),
    (21, Protocol::Tcp, "ftp"),
    (22, Protocol::Tcp, "ssh"),
    (23, Protocol::Tcp, "telnet"),
    (25, Protocol::Tcp, "smtp"),
    (53, Protocol::Tcp, "domain"),
    (53, Protocol::Udp, "domain"),
    (67, Protocol::Udp, "bootps"),
    (68, Protocol::Udp, "bootpc"),
    (69, Protocol::Udp, "tftp"),
    (80, Protocol::Tcp, "http"),
    (88, Protocol::Tcp, "kerberos"),
    (88, Protocol::Udp, "kerberos"),
    (110, Protocol::Tcp, "pop3"),
    (111, Protocol::Tcp, "sunrpc"),
    (111, Protocol::Udp, "sunrpc"),
    (123, Protocol::Udp, "ntp"),
    (137, Protocol::Udp, "netbios-ns"),
    (138, Protocol::Udp, "netbios-dgm"),
    (139, Protocol::Tcp, "netbios-ssn"),
    (143, Protocol::Tcp, "imap"),
    (161, Protocol::Udp, "snmp"),
    (389, Protocol::Tcp, "ldap"),
    (443, Protocol::Tcp, "https"),
    (443, Protocol::Udp, "https"),
    (445, Protocol::Tcp, "microsoft-ds"),
    (465, Protocol::Tcp, "submissions"),
    (500, Protocol::Udp, "isakmp"),
    (514, Protocol::Udp, "syslog"),
    (548, Protocol::Tcp, "afpovertcp"),
    (587, Protocol::Tcp, "submission"),
    (631, Protocol::Tcp, "ipp"),
    (636, Protocol::Tcp, "ldaps"),
    (993, Protocol::Tcp, "imaps"),
    (995, Protocol::Tcp, "pop3s"),
    (1433, Protocol::Tcp, "ms-sql-s"),
    (1883, Protocol::Tcp, "mqtt"),
    (1900, Protocol::Udp, "ssdp"),
    (2049, Protocol::Tcp, "nfs"),
    (3306, Protocol::Tcp, "mysql"),
    (3389, Protocol::Tcp, "ms-wbt-server"),
    (5353, Protocol::Udp, "mdns"),
    (5432, Protocol::Tcp, "postgresql"),
    (5672, Protocol::Tcp, "amqp"),
    (5900, Protocol::Tcp, "rfb"),
    (6379, Protocol::Tcp, "redis"),
    (8080, Protocol::Tcp, "http-alt"),
    (8443, Protocol::Tcp, "pcsync-https"),
    (9200, Protocol::Tcp, "wap-wsp"),
    (11211, Protocol::Tcp, "memcache"),
    (27017, Protocol::Tcp, "mongodb"),
];

/// One row of the IANA CSV. Other columns are ignored.
#[derive(Debug, Deserialize)]
struct IanaRow {
    #[serde(rename = "Service Name", default)]
    service_name: String,
    #[serde(rename = "Port Number", default)]
    port_number: String,
    #[serde(rename = "Transport Protocol", default)]
    transport_protocol: String,
}

/// Mapping from (port, protocol) to service name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistry {
    entries: HashMap<(u16, Protocol), String>,
    origin: RegistryOrigin,
}

impl ServiceRegistry {
    /// An empty registry attributed to `origin`.
    pub fn empty(origin: RegistryOrigin) -> Self {
        Self {
            entries: HashMap::new(),
            origin,
        }
    }

    /// The built-in table of well-known ports. Never empty.
    pub fn builtin() -> Self {
        let mut registry = Self::empty(RegistryOrigin::Builtin);
        for (port, protocol, name) in BUILTIN {
            registry.insert(*port, *protocol, *name);
        }
        registry
    }

    /// Parse the IANA `service-names-port-numbers.csv` document.
    ///
    /// Fails when the document yields no usable entry at all.
    pub fn from_iana_csv(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut registry = Self::empty(RegistryOrigin::Iana);
        let mut bad_rows = 0usize;

        for row in reader.deserialize::<IanaRow>() {
            let row = match row {
                Ok(row) => row,
                Err(_) => {
                    bad_rows += 1;
                    continue;
                }
            };

            let name = row.service_name.trim();
            if name.is_empty() {
                continue;
            }
            let Ok(protocol) = row.transport_protocol.trim().parse::<Protocol>() else {
                continue;
            };
            let Some((first, last)) = parse_port_range(&row.port_number) else {
                continue;
            };

            for port in first..=last {
                registry.insert(port, protocol, name);
            }
        }

        if bad_rows > 0 {
            tracing::debug!(bad_rows, "ignored unreadable rows in IANA registry");
        }

        if registry.is_empty() {
            return Err(Error::RegistryUnavailable(
                "IANA registry contained no tcp/udp entries".to_string(),
            ));
        }
        Ok(registry)
    }

    /// Parse a services database in `/etc/services` format.
    ///
    /// Lines look like `https  443/tcp  # comment`; anything else is ignored.
    pub fn from_services(content: &str) -> Self {
        let mut registry = Self::empty(RegistryOrigin::SystemServices);

        for line in content.lines() {
            let line = match line.find('#') {
                Some(i) => &line[..i],
                None => line,
            };
            let mut parts = line.split_whitespace();
            let (Some(name), Some(port_proto)) = (parts.next(), parts.next()) else {
                continue;
            };
            let Some((port, protocol)) = port_proto.split_once('/') else {
                continue;
            };
            let (Ok(port), Ok(protocol)) = (port.parse::<u16>(), protocol.parse::<Protocol>())
            else {
                continue;
            };
            registry.insert(port, protocol, name);
        }

        registry
    }

    /// Add an entry unless the pair already has a name.
    pub fn insert(&mut self, port: u16, protocol: Protocol, name: impl Into<String>) {
        self.entries.entry((port, protocol)).or_insert_with(|| name.into());
    }

    /// Copy every entry of `other` whose pair is missing here.
    pub fn fill_missing(&mut self, other: &ServiceRegistry) {
        for ((port, protocol), name) in &other.entries {
            self.insert(*port, *protocol, name.as_str());
        }
    }

    /// Look up the registered name for a pair.
    pub fn lookup(&self, port: u16, protocol: Protocol) -> Option<&str> {
        self.entries.get(&(port, protocol)).map(String::as_str)
    }

    /// Registered name for a pair, or `"unknown"`.
    pub fn service_name(&self, port: u16, protocol: Protocol) -> &str {
        self.lookup(port, protocol).unwrap_or(UNKNOWN_SERVICE)
    }

    pub fn origin(&self) -> RegistryOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse `"443"` or `"6000-6063"` into an inclusive range.
fn parse_port_range(s: &str) -> Option<(u16, u16)> {
    let s = s.trim();
    match s.split_once('-') {
        Some((first, last)) => {
            let first: u16 = first.trim().parse().ok()?;
            let last: u16 = last.trim().parse().ok()?;
            (first <= last).then_some((first, last))
        }
        None => {
            let port: u16 = s.parse().ok()?;
            Some((port, port))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IANA_SAMPLE: &str = r#"Service Name,Port Number,Transport Protocol,Description,Assignee,Contact,Registration Date,Modification Date,Reference,Service Code,Unauthorized Use Reported,Assignment Notes
,0,tcp,Reserved,[Jon_Postel],[Jon_Postel],,,,,,
http,80,tcp,World Wide Web HTTP,[Tim_Berners_Lee],[Tim_Berners_Lee],,,"[RFC9110]",,,"Defined TXT keys: u=<username>
p=<password> path=<path to document>"
www,80,tcp,World Wide Web HTTP,,,,,,,,
https,443,tcp,http protocol over TLS/SSL,[IESG],[IETF_Chair],,,,,,
https,443,udp,http protocol over TLS/SSL,[IESG],[IETF_Chair],,,,,,
x11,6000-6003,tcp,X Window System,[Stephen_Lewis],[Stephen_Lewis],,,,,,
sctp-only,9,sctp,Discard,,,,,,,,
"#;

    #[test]
    fn test_builtin_not_empty() {
        let registry = ServiceRegistry::builtin();
        assert!(!registry.is_empty());
        assert_eq!(registry.origin(), RegistryOrigin::Builtin);
        assert_eq!(registry.lookup(22, Protocol::Tcp), Some("ssh"));
    }

    #[test]
    fn test_from_iana_csv() {
        let registry = ServiceRegistry::from_iana_csv(IANA_SAMPLE).unwrap();
        assert_eq!(registry.origin(), RegistryOrigin::Iana);
        // First name wins for a pair
        assert_eq!(registry.lookup(80, Protocol::Tcp), Some("http"));
        assert_eq!(registry.lookup(443, Protocol::Udp), Some("https"));
        // Ranges are expanded
        assert_eq!(registry.lookup(6002, Protocol::Tcp), Some("x11"));
        // Reserved rows without a name and non tcp/udp rows are dropped
        assert_eq!(registry.lookup(0, Protocol::Tcp), None);
        assert_eq!(registry.lookup(9, Protocol::Tcp), None);
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_from_iana_csv_rejects_garbage() {
        let result = ServiceRegistry::from_iana_csv("<html><body>Service Unavailable</body></html>");
        assert!(matches!(result, Err(Error::RegistryUnavailable(_))));
    }

    #[test]
    fn test_from_services() {
        let content = "# Network services\n\
                       ssh\t\t22/tcp\t\t\t\t# SSH Remote Login Protocol\n\
                       domain\t\t53/udp\n\
                       http\t\t80/tcp\t\twww\n\
                       broken line\n";
        let registry = ServiceRegistry::from_services(content);
        assert_eq!(registry.origin(), RegistryOrigin::SystemServices);
        assert_eq!(registry.lookup(22, Protocol::Tcp), Some("ssh"));
        assert_eq!(registry.lookup(53, Protocol::Udp), Some("domain"));
        assert_eq!(registry.lookup(80, Protocol::Tcp), Some("http"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_fill_missing_keeps_existing() {
        let mut registry = ServiceRegistry::empty(RegistryOrigin::Iana);
        registry.insert(22, Protocol::Tcp, "custom-ssh");
        registry.fill_missing(&ServiceRegistry::builtin());
        assert_eq!(registry.lookup(22, Protocol::Tcp), Some("custom-ssh"));
        assert_eq!(registry.lookup(443, Protocol::Tcp), Some("https"));
        assert_eq!(registry.origin(), RegistryOrigin::Iana);
    }

    #[test]
    fn test_service_name_unknown() {
        let registry = ServiceRegistry::builtin();
        assert_eq!(registry.service_name(443, Protocol::Tcp), "https");
        assert_eq!(registry.service_name(65000, Protocol::Udp), UNKNOWN_SERVICE);
    }

    #[test]
    fn test_parse_port_range() {
        assert_eq!(parse_port_range("443"), Some((443, 443)));
        assert_eq!(parse_port_range("6000-6063"), Some((6000, 6063)));
        assert_eq!(parse_port_range(""), None);
        assert_eq!(parse_port_range("10-5"), None);
    }
}
