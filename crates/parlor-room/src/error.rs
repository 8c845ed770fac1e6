//! Error types for the room layer.

/// Errors that can occur during room operations.
///
/// Deliberately small: most invalid input to the room (bad payloads,
/// precondition violations, unknown opcodes) is *ignored* per the
/// protocol's error taxonomy, not surfaced as an error. Only admission
/// can actually refuse.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room has reached its configured capacity. The caller is
    /// expected to send a rejection frame and close the transport
    /// without registering a handler.
    #[error("room is full ({0} players)")]
    RoomFull(usize),
}
