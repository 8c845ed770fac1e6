//! TCP listener and connection types.
//!
//! Deliberately thin: all framing lives in `parlor-protocol`, so this
//! module only hands out raw streams plus a process-unique id for logs.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use crate::{ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A TCP listener that accepts incoming lobby connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    ///
    /// Useful when binding to port 0 (tests) to learn the real port.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and accepts the next incoming connection.
    pub async fn accept(&self) -> Result<TcpConnection, TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // Frames are small; latency matters more than batching.
        let _ = stream.set_nodelay(true);

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %peer, "accepted connection");

        Ok(TcpConnection { id, peer, stream })
    }
}

/// One accepted (or dialed) TCP connection.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    stream: TcpStream,
}

impl TcpConnection {
    /// Dials a remote server. Used by the client library.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::ConnectFailed)?;
        let _ = stream.set_nodelay(true);
        let peer = stream
            .peer_addr()
            .map_err(TransportError::ConnectFailed)?;
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        Ok(Self { id, peer, stream })
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the remote peer's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Splits the connection into independently owned read and write
    /// halves, so one task can block on reads while another writes.
    pub fn into_split(self) -> (OwnedReadHalf, OwnedWriteHalf) {
        self.stream.into_split()
    }
}
