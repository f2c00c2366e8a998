//! Socket endpoints as printed by lsof and ss.

use crate::domain::{AddressFamily, RemoteEndpoint};

/// One side of a socket. Either half may be a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host as printed, IPv6 brackets kept; `*` for any.
    pub host: String,
    /// `None` for a wildcard port: `*`, or the `0` ss prints for unconnected peers.
    pub port: Option<u16>,
}

impl Endpoint {
    /// Family implied by the host text; a bare `*` has none.
    pub fn family(&self) -> Option<AddressFamily> {
        if self.host == "*" {
            None
        } else if self.host.starts_with('[') || self.host.contains(':') {
            Some(AddressFamily::Ipv6)
        } else {
            Some(AddressFamily::Ipv4)
        }
    }

    /// The peer of a connected socket. Wildcard peers are not connections.
    pub fn into_remote(self) -> Option<RemoteEndpoint> {
        let port = self.port?;
        Some(RemoteEndpoint {
            address: self.host,
            port,
        })
    }
}

/// Split `host:port` text into an [`Endpoint`].
///
/// The port separator is the last colon, or the `]:` closing a bracketed
/// IPv6 host, so scoped hosts like `127.0.0.53%lo` and `[fe80::1%en0]`
/// survive intact. Text without a port separator does not parse.
pub fn parse_endpoint(text: &str) -> Option<Endpoint> {
    let (host, port) = match text.strip_prefix('[') {
        Some(rest) => {
            let (inner, port) = rest.split_once("]:")?;
            (&text[..inner.len() + 2], port)
        }
        None => text.rsplit_once(':')?,
    };

    let port = match port {
        "*" => None,
        digits => match digits.parse::<u16>().ok()? {
            0 => None,
            n => Some(n),
        },
    };

    Some(Endpoint {
        host: if host.is_empty() { "*" } else { host }.to_string(),
        port,
    })
}
