//! Prober error types.

use std::net::IpAddr;

use thiserror::Error;

use crate::history::Sequence;

/// Substrings that identify a read error caused by our own socket teardown.
const TEARDOWN_PATTERNS: &[&str] = &["read udp", "use of closed", "socket closed"];

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("cannot resolve host '{host}': {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no address found for host '{0}'")]
    NoAddress(String),

    #[error("cannot open ICMP socket for '{host}': {source}")]
    Socket {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message} {seq} {addr}")]
    Transmit {
        seq: Sequence,
        addr: IpAddr,
        message: String,
    },

    #[error("{0}")]
    Receive(String),

    #[error("socket closed")]
    SocketClosed,

    #[error("prober already started")]
    AlreadyStarted,
}

impl ProbeError {
    /// Whether this error is the expected by-product of stopping the prober.
    pub fn is_teardown_noise(&self) -> bool {
        match self {
            ProbeError::SocketClosed => true,
            ProbeError::Receive(message) => TEARDOWN_PATTERNS.iter().any(|p| message.contains(p)),
            _ => false,
        }
    }
}
