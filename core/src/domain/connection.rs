//! Connection records produced by the socket parsers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Process id used when the owner of a socket cannot be resolved.
pub const UNKNOWN_PID: u32 = 0;

/// Process name used when the owner of a socket cannot be resolved.
pub const UNKNOWN_PROCESS: &str = "<unknown>";

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Lower-case name, as used by the IANA registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    /// Accepts `tcp`, `udp` and their `6` suffixed variants in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" | "tcp6" | "tcp4" => Ok(Protocol::Tcp),
            "udp" | "udp6" | "udp4" => Ok(Protocol::Udp),
            other => Err(format!("unknown protocol '{}'", other)),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
        }
    }
}

// ============================================================================
// AddressFamily
// ============================================================================

/// IP family of a socket, the lsof TYPE column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    #[serde(rename = "IPv4")]
    Ipv4,
    #[serde(rename = "IPv6")]
    Ipv6,
}

impl FromStr for AddressFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ipv4" => Ok(AddressFamily::Ipv4),
            "ipv6" => Ok(AddressFamily::Ipv6),
            other => Err(format!("unknown address family '{}'", other)),
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "IPv4"),
            AddressFamily::Ipv6 => write!(f, "IPv6"),
        }
    }
}

// ============================================================================
// ConnectionRecord
// ============================================================================

/// The far end of an established connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteEndpoint {
    pub address: String,
    pub port: u16,
}

impl std::fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// One socket as reported by the OS listing facility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    /// Local port number.
    pub local_port: u16,
    /// Transport protocol.
    pub protocol: Protocol,
    /// Owning process id, `UNKNOWN_PID` when unresolved.
    pub process_id: u32,
    /// Owning process name, `UNKNOWN_PROCESS` when unresolved.
    pub process_name: String,
    /// TCP state such as `LISTEN`; UDP sockets have none.
    pub state: Option<String>,
    /// Owning user, when the facility reports it.
    pub user: Option<String>,
    /// Local address the socket is bound to (`*` for any).
    pub local_address: String,
    /// IP family, when the facility or the address reveals it.
    pub family: Option<AddressFamily>,
    /// Peer of a connected socket.
    pub remote: Option<RemoteEndpoint>,
}

impl ConnectionRecord {
    /// Create a record with the required fields; the rest start empty.
    pub fn new(
        local_port: u16,
        protocol: Protocol,
        process_id: u32,
        process_name: impl Into<String>,
        state: Option<&str>,
    ) -> Self {
        Self {
            local_port,
            protocol,
            process_id,
            process_name: process_name.into(),
            state: state.map(str::to_string),
            user: None,
            local_address: "*".to_string(),
            family: None,
            remote: None,
        }
    }

    /// Record for a socket whose owner could not be resolved.
    pub fn unowned(local_port: u16, protocol: Protocol, state: Option<&str>) -> Self {
        Self::new(local_port, protocol, UNKNOWN_PID, UNKNOWN_PROCESS, state)
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_local_address(mut self, address: impl Into<String>) -> Self {
        self.local_address = address.into();
        self
    }

    pub fn with_family(mut self, family: Option<AddressFamily>) -> Self {
        self.family = family;
        self
    }

    pub fn with_remote(mut self, address: impl Into<String>, port: u16) -> Self {
        self.remote = Some(RemoteEndpoint {
            address: address.into(),
            port,
        });
        self
    }

    /// Whether the owning process is known.
    pub fn has_owner(&self) -> bool {
        self.process_id != UNKNOWN_PID
    }

    /// Whether the socket accepts inbound traffic: listening TCP or any UDP.
    pub fn is_listening(&self) -> bool {
        match self.protocol {
            Protocol::Tcp => self.state.as_deref() == Some("LISTEN"),
            Protocol::Udp => self.remote.is_none(),
        }
    }
}

impl std::fmt::Display for ConnectionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}/{} (PID: {}, Process: {})",
            self.local_address, self.local_port, self.protocol, self.process_id, self.process_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("TCP".parse::<Protocol>(), Ok(Protocol::Tcp));
        assert_eq!("udp6".parse::<Protocol>(), Ok(Protocol::Udp));
        assert!("sctp".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_address_family() {
        assert_eq!("IPv6".parse::<AddressFamily>(), Ok(AddressFamily::Ipv6));
        assert_eq!("ipv4".parse::<AddressFamily>(), Ok(AddressFamily::Ipv4));
        assert!("unix".parse::<AddressFamily>().is_err());
        assert_eq!(AddressFamily::Ipv6.to_string(), "IPv6");
    }

    #[test]
    fn test_remote_display() {
        let record = ConnectionRecord::new(50000, Protocol::Tcp, 1, "curl", Some("ESTABLISHED"))
            .with_remote("93.184.216.34", 443);
        assert_eq!(record.remote.unwrap().to_string(), "93.184.216.34:443");
    }

    #[test]
    fn test_unowned_record() {
        let record = ConnectionRecord::unowned(53, Protocol::Udp, None);
        assert!(!record.has_owner());
        assert_eq!(record.process_name, UNKNOWN_PROCESS);
        assert!(record.is_listening());
    }

    #[test]
    fn test_is_listening() {
        let listen = ConnectionRecord::new(443, Protocol::Tcp, 1, "nginx", Some("LISTEN"));
        let estab = ConnectionRecord::new(443, Protocol::Tcp, 1, "nginx", Some("ESTABLISHED"))
            .with_remote("10.0.0.2", 51234);
        assert!(listen.is_listening());
        assert!(!estab.is_listening());
    }
}
