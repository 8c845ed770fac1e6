//! Transport layer for Parlor.
//!
//! Provides [`TcpTransport`] (the listen/accept side) and
//! [`TcpConnection`] (one stream, splittable into read/write halves),
//! plus [`ConnectionId`] for correlating log lines before a client id
//! has been assigned.

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Distinct from the protocol-level client id: a `ConnectionId` exists
/// from the moment `accept` returns, before admission has assigned
/// anything, and it never travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_equality() {
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(1);
        let c = ConnectionId::new(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
