//! Error types for the protocol layer.
//!
//! Each crate in Parlor defines its own error enum. A `ProtocolError`
//! always means the problem is in framing or payload decoding, not in
//! networking or room management.

use crate::frame::MAX_BODY_LEN;

/// Errors that can occur while framing or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The peer closed the stream, possibly mid-frame.
    ///
    /// The framing contract is all-or-nothing: a header or body that
    /// cannot be completed is reported as a closed connection, never
    /// as a short frame.
    #[error("connection closed")]
    ConnectionClosed,

    /// Reading or writing the underlying stream failed.
    #[error("stream i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The header carried a body length that is negative or larger
    /// than [`MAX_BODY_LEN`]. The protocol itself imposes no limit,
    /// so this cap is what stands between a hostile header and an
    /// unbounded allocation.
    #[error("invalid body length {0} (max {MAX_BODY_LEN})")]
    InvalidBodyLength(i32),

    /// The message-type field doesn't name any opcode in the catalog
    /// for its direction.
    #[error("unknown opcode {0}")]
    UnknownOpcode(i32),

    /// The body doesn't match the payload shape expected for the
    /// opcode — wrong length, missing NUL terminator, invalid UTF-8.
    ///
    /// This is the one *recoverable* decode error: the connection's
    /// framing is still intact, only this message is unusable.
    #[error("bad payload: {0}")]
    BadPayload(String),
}
