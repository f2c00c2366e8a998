//! `lsof -i -n -P` line format.
//!
//! ```text
//! COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
//! nginx      123  root    6u  IPv4 0x1234567890abcdef      0t0  TCP *:443 (LISTEN)
//! Safari    4242  me     31u  IPv4 0x2345678901bcdef0      0t0  TCP 10.0.0.5:50123->17.253.1.1:443 (ESTABLISHED)
//! mDNSResp   301  _mdns  12u  IPv6 0x3456789012cdef01      0t0  UDP *:5353
//! ```

use std::sync::OnceLock;

use regex::bytes::Regex;

use super::address::{parse_endpoint, Endpoint};
use super::LineOutcome;
use crate::domain::{AddressFamily, ConnectionRecord, Protocol, RemoteEndpoint};

/// COMMAND PID USER FD TYPE NODE NAME, with DEVICE and SIZE/OFF blank.
const MIN_COLUMNS: usize = 7;

/// Index of the TYPE column; the protocol token never appears before it.
const TYPE_COLUMN: usize = 4;

pub(super) fn parse_line(line: &str) -> LineOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineOutcome::Blank;
    }
    if trimmed.starts_with("COMMAND") {
        return LineOutcome::Header;
    }

    let components: Vec<&str> = trimmed.split_whitespace().collect();
    if components.len() < MIN_COLUMNS {
        return LineOutcome::Malformed;
    }

    let pid: u32 = match components[1].parse() {
        Ok(p) => p,
        Err(_) => return LineOutcome::Malformed,
    };

    // DEVICE and SIZE/OFF may be blank, so locate NODE by its value.
    let Some((node, protocol)) = components
        .iter()
        .enumerate()
        .skip(TYPE_COLUMN + 1)
        .find_map(|(i, c)| c.parse::<Protocol>().ok().map(|p| (i, p)))
    else {
        return LineOutcome::Malformed;
    };

    let Some(name) = components.get(node + 1) else {
        return LineOutcome::Malformed;
    };

    let (local, remote) = match name.split_once("->") {
        Some((local, remote)) => (local, Some(remote)),
        None => (*name, None),
    };

    let Some(local) = parse_endpoint(local) else {
        return LineOutcome::Malformed;
    };
    let Some(local_port) = local.port else {
        return LineOutcome::Malformed;
    };
    let family = components[TYPE_COLUMN]
        .parse::<AddressFamily>()
        .ok()
        .or_else(|| local.family());

    let state = components
        .get(node + 2)
        .filter(|s| s.starts_with('('))
        .map(|s| s.trim_matches(&['(', ')'][..]).to_uppercase());

    let mut record = ConnectionRecord::new(
        local_port,
        protocol,
        pid,
        unescape(components[0]),
        state.as_deref(),
    )
    .with_user(components[2])
    .with_local_address(local.host)
    .with_family(family);

    if let Some(RemoteEndpoint { address, port }) = remote
        .and_then(parse_endpoint)
        .and_then(Endpoint::into_remote)
    {
        record = record.with_remote(address, port);
    }

    LineOutcome::Record(record)
}

/// Decode the `\xNN` escapes lsof uses for bytes outside printable ASCII.
pub(super) fn unescape(name: &str) -> String {
    static ESCAPE: OnceLock<Regex> = OnceLock::new();
    let escape = ESCAPE.get_or_init(|| Regex::new(r"\\x([0-9a-fA-F]{2})").expect("valid regex"));

    let decoded = escape.replace_all(name.as_bytes(), |caps: &regex::bytes::Captures| {
        // Two hex digits always fit in a byte.
        let hex = std::str::from_utf8(&caps[1]).unwrap_or("3f");
        vec![u8::from_str_radix(hex, 16).unwrap_or(b'?')]
    });

    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> ConnectionRecord {
        match parse_line(line) {
            LineOutcome::Record(r) => r,
            other => panic!("expected a record, got {:?}", other),
        }
    }

    #[test]
    fn test_listening_tcp() {
        let r = record("nginx      123  root    6u  IPv4 0x1234567890abcdef      0t0  TCP *:443 (LISTEN)");
        assert_eq!(r.process_id, 123);
        assert_eq!(r.process_name, "nginx");
        assert_eq!(r.user.as_deref(), Some("root"));
        assert_eq!(r.protocol, Protocol::Tcp);
        assert_eq!(r.local_port, 443);
        assert_eq!(r.local_address, "*");
        assert_eq!(r.state.as_deref(), Some("LISTEN"));
        assert_eq!(r.family, Some(AddressFamily::Ipv4));
        assert!(r.remote.is_none());
    }

    #[test]
    fn test_established_with_remote() {
        let r = record(
            "Safari    4242  me   31u  IPv4 0x2345678901bcdef0      0t0  TCP 10.0.0.5:50123->17.253.1.1:443 (ESTABLISHED)",
        );
        assert_eq!(r.local_port, 50123);
        assert_eq!(r.state.as_deref(), Some("ESTABLISHED"));
        let remote = r.remote.unwrap();
        assert_eq!(remote.address, "17.253.1.1");
        assert_eq!(remote.port, 443);
    }

    #[test]
    fn test_udp_without_state() {
        let r = record("mDNSResponder 301 _mdns 12u IPv6 0x3456789012cdef01 0t0 UDP *:5353");
        assert_eq!(r.protocol, Protocol::Udp);
        assert_eq!(r.local_port, 5353);
        assert!(r.state.is_none());
    }

    #[test]
    fn test_ipv6_address() {
        let r = record("node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)");
        assert_eq!(r.local_address, "[::1]");
        assert_eq!(r.local_port, 3000);
        assert_eq!(r.family, Some(AddressFamily::Ipv6));
    }

    #[test]
    fn test_linux_blank_device_column() {
        // Blank DEVICE column shifts NODE left
        let r = record("sshd  812 root 3u IPv4 0t0 TCP *:22 (LISTEN)");
        assert_eq!(r.local_port, 22);
        assert_eq!(r.process_name, "sshd");

        // ...and a UDP line without a state is one column shorter still
        let r = record("chronyd 700 chrony 5u IPv4 0t0 UDP *:323");
        assert_eq!(r.protocol, Protocol::Udp);
        assert_eq!(r.local_port, 323);
        assert!(r.state.is_none());
    }

    #[test]
    fn test_unbound_udp_is_skipped() {
        assert!(matches!(
            parse_line("dhclient 611 root 6u IPv4 0x1 0t0 UDP *:*"),
            LineOutcome::Malformed
        ));
    }

    #[test]
    fn test_unescape_process_name() {
        let r = record(r"Code\x20Helper  1234  user   10u  IPv4 0x1234567890abcdef      0t0  TCP *:3000 (LISTEN)");
        assert_eq!(r.process_name, "Code Helper");
        assert_eq!(unescape(r"a\x2fb"), "a/b");
        assert_eq!(unescape(r"caf\xc3\xa9"), "café");
    }

    #[test]
    fn test_header_and_blank() {
        assert!(matches!(
            parse_line("COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME"),
            LineOutcome::Header
        ));
        assert!(matches!(parse_line("   "), LineOutcome::Blank));
    }

    #[test]
    fn test_malformed_lines() {
        // Too few columns
        assert!(matches!(parse_line("nginx 123 root"), LineOutcome::Malformed));
        // Non-numeric PID
        assert!(matches!(
            parse_line("nginx abc root 6u IPv4 0x1 0t0 TCP *:443 (LISTEN)"),
            LineOutcome::Malformed
        ));
        // No protocol column
        assert!(matches!(
            parse_line("nginx 123 root 6u IPv4 0x1 0t0 SCTP *:443 (LISTEN)"),
            LineOutcome::Malformed
        ));
        // Unparseable port
        assert!(matches!(
            parse_line("nginx 123 root 6u IPv4 0x1 0t0 TCP *:https (LISTEN)"),
            LineOutcome::Malformed
        ));
    }
}
