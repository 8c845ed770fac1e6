//! # Parlor
//!
//! A single-room multiplayer lobby server over framed TCP.
//!
//! Clients connect, receive an identity, and negotiate shared room
//! state — ownership, ready flags, character/item/map selections, a
//! Waiting/Running round machine — through a compact binary protocol.
//! The server relays every state change to all connected peers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! # async fn run() -> Result<(), ParlorError> {
//! let server = ParlorServerBuilder::new()
//!     .bind("0.0.0.0:7777")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ParlorError;
pub use server::{ParlorServer, ParlorServerBuilder};

/// Common imports for server embedders and tests.
pub mod prelude {
    pub use crate::{ParlorError, ParlorServer, ParlorServerBuilder};
    pub use parlor_protocol::{
        payload, read_frame, write_frame, ClientId, ClientOpcode, Frame,
        PlayerSummary, ProtocolError, RoomSnapshot, ServerOpcode,
    };
    pub use parlor_room::{GamePhase, Room, RoomConfig, RoomError, RoundMode};
    pub use parlor_transport::{TcpConnection, TcpTransport, TransportError};
}
