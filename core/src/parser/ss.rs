//! `ss -H -t -u -a -n -p` line format.
//!
//! ```text
//! tcp   LISTEN 0      4096   127.0.0.53%lo:53     0.0.0.0:*    users:(("systemd-resolve",pid=612,fd=14))
//! tcp   ESTAB  0      0      10.0.0.5:22          10.0.0.9:51544 users:(("sshd",pid=1201,fd=4))
//! udp   UNCONN 0      0      0.0.0.0:5353         0.0.0.0:*
//! ```
//!
//! The process column is missing for sockets owned by other users unless `ss`
//! runs as root; those lines become records with the placeholder owner.

use std::sync::OnceLock;

use regex::Regex;

use super::address::{parse_endpoint, Endpoint};
use super::LineOutcome;
use crate::domain::{ConnectionRecord, Protocol, RemoteEndpoint};

/// Netid, State, Recv-Q, Send-Q, Local, Peer.
const MIN_COLUMNS: usize = 6;

pub(super) fn parse_line(line: &str) -> LineOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineOutcome::Blank;
    }
    if trimmed.starts_with("Netid") || trimmed.starts_with("State") {
        return LineOutcome::Header;
    }

    let components: Vec<&str> = trimmed.split_whitespace().collect();
    if components.len() < MIN_COLUMNS {
        return LineOutcome::Malformed;
    }

    let Ok(protocol) = components[0].parse::<Protocol>() else {
        return LineOutcome::Malformed;
    };

    let Some(local) = parse_endpoint(components[4]) else {
        return LineOutcome::Malformed;
    };
    let Some(local_port) = local.port else {
        return LineOutcome::Malformed;
    };

    let state = normalize_state(components[1]);

    let mut record = match parse_owner(&components[MIN_COLUMNS..].join(" ")) {
        Some((name, pid)) => ConnectionRecord::new(local_port, protocol, pid, name, state.as_deref()),
        None => ConnectionRecord::unowned(local_port, protocol, state.as_deref()),
    }
    .with_family(local.family())
    .with_local_address(local.host);

    if let Some(RemoteEndpoint { address, port }) =
        parse_endpoint(components[5]).and_then(Endpoint::into_remote)
    {
        record = record.with_remote(address, port);
    }

    LineOutcome::Record(record)
}

/// Map ss state names onto the names lsof uses.
fn normalize_state(state: &str) -> Option<String> {
    match state {
        "UNCONN" => None,
        "ESTAB" => Some("ESTABLISHED".to_string()),
        other => Some(other.replace('-', "_")),
    }
}

/// First `("name",pid=N,fd=M)` entry of the `users:(...)` field.
fn parse_owner(field: &str) -> Option<(String, u32)> {
    static USERS: OnceLock<Regex> = OnceLock::new();
    let users =
        USERS.get_or_init(|| Regex::new(r#"\("(.+?)",pid=(\d+),fd=\d+\)"#).expect("valid regex"));

    let caps = users.captures(field)?;
    let pid: u32 = caps[2].parse().ok()?;
    Some((caps[1].to_string(), pid))
}
