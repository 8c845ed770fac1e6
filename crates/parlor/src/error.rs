//! Unified error type for the Parlor server.

use parlor_protocol::ProtocolError;
use parlor_room::RoomError;
use parlor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `parlor` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// A transport-level error (bind, accept, connect).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (framing, payload shape).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (capacity).
    #[error(transparent)]
    Room(#[from] RoomError),
}
