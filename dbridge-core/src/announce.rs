//! Inspector log-line parsing
//!
//! The inspector protocol has no handshake for "I'm ready"; the only signal is
//! a free-text announcement on the child's stderr. The patterns live here,
//! behind plain functions, so the matching can change without touching the
//! supervisor.

use std::sync::LazyLock;

use regex::Regex;

/// Address the child's inspector actually bound, scraped from the listening
/// announcement. May differ from the requested pair (wildcard hosts and port 0
/// are resolved by the child).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugAddress {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for DebugAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

// IPv6 hosts appear bracketed: ws://[::1]:9229/uuid
static LISTENING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Debugger listening on ws://\[?(.+?)\]?:(\d+)/").expect("valid listening pattern")
});

static DISCONNECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Waiting for the debugger to disconnect\.\.\.").expect("valid disconnect pattern")
});

/// Extract the bound inspector address from a listening announcement, if the
/// line contains one.
pub fn parse_listening(line: &str) -> Option<DebugAddress> {
    let captures = LISTENING.captures(line)?;
    let host = captures.get(1)?.as_str().to_string();
    let port = captures.get(2)?.as_str().parse().ok()?;
    Some(DebugAddress { host, port })
}

/// True if the line is the trailer the runtime prints once the program has
/// finished and is only kept alive by the attached debugger.
pub fn is_disconnect_trailer(line: &str) -> bool {
    DISCONNECTED.is_match(line)
}
