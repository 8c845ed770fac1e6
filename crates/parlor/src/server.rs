//! `ParlorServer` builder and accept loop.
//!
//! This is the entry point for running a lobby server. It ties together
//! the layers: transport → protocol → room.

use std::sync::Arc;

use parlor_room::{Room, RoomConfig};
use parlor_transport::TcpTransport;
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::ParlorError;

/// Shared server state passed to each connection handler task.
///
/// A server hosts exactly one room; every handler serializes its room
/// access through this one `Mutex`.
pub(crate) struct ServerState {
    pub(crate) room: Mutex<Room>,
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,ignore
/// use parlor::prelude::*;
///
/// let server = ParlorServerBuilder::new()
///     .bind("0.0.0.0:7777")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:7777".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<ParlorServer, ParlorError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            room: Mutex::new(Room::new(self.room_config)),
        });

        Ok(ParlorServer { transport, state })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Parlor lobby server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer {
    transport: TcpTransport,
    state: Arc<ServerState>,
}

impl ParlorServer {
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(self) -> Result<(), ParlorError> {
        tracing::info!("parlor server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
