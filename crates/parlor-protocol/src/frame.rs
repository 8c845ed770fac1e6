//! Frame codec: the fixed 12-byte header wire format.
//!
//! Every message on the wire is one frame — a header of three
//! little-endian signed 32-bit integers (`sender_id`, `opcode`,
//! `body_len`) followed by exactly `body_len` raw payload bytes. No
//! padding, no checksum. The payload is opaque at this layer; its shape
//! depends on the opcode and is handled by the `payload` module.
//!
//! The underlying transport is a byte stream with partial-delivery
//! semantics: a single read may return fewer bytes than asked for, and a
//! frame may arrive split across arbitrarily many reads. [`read_frame`]
//! therefore loops until the exact byte count is satisfied, and fails
//! with [`ProtocolError::ConnectionClosed`] rather than ever yielding a
//! short frame.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::ProtocolError;

/// Size of the fixed frame header in bytes: three i32 fields.
pub const HEADER_LEN: usize = 12;

/// Upper bound on a frame body. The protocol itself carries no limit,
/// so the decoder caps allocations at something a lobby message will
/// never legitimately reach.
pub const MAX_BODY_LEN: usize = 64 * 1024;

/// One header-plus-body unit of the wire protocol.
///
/// `opcode` is kept as a raw `i32` here: the codec doesn't know (or
/// care) which direction's catalog the value belongs to. Conversion to
/// [`ClientOpcode`](crate::ClientOpcode) or
/// [`ServerOpcode`](crate::ServerOpcode) happens at the dispatch site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Originating client id, or 0 for server-originated frames.
    pub sender_id: i32,
    /// Message type, from one of the two opcode catalogs.
    pub opcode: i32,
    /// Raw payload bytes. May be empty.
    pub body: Vec<u8>,
}

impl Frame {
    /// Builds a frame. `opcode` accepts either catalog enum or a raw i32.
    pub fn new(
        sender_id: impl Into<i32>,
        opcode: impl Into<i32>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            opcode: opcode.into(),
            body,
        }
    }

    /// Serializes header and body into a single contiguous buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.body.len());
        buf.extend_from_slice(&self.sender_id.to_le_bytes());
        buf.extend_from_slice(&self.opcode.to_le_bytes());
        buf.extend_from_slice(&(self.body.len() as i32).to_le_bytes());
        buf.extend_from_slice(&self.body);
        buf
    }
}

/// Maps stream errors into the protocol taxonomy.
///
/// `read_exact` reports a mid-read close as `UnexpectedEof`; per the
/// framing contract that is a closed connection, not an i/o failure.
fn map_read_err(e: std::io::Error) -> ProtocolError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::ConnectionClosed
    } else {
        ProtocolError::Io(e)
    }
}

/// Reads exactly one frame from the stream.
///
/// Suspends until the full header and body are available. Tolerates
/// arbitrary fragmentation of the byte stream (`read_exact` loops over
/// partial reads internally).
///
/// # Errors
/// - [`ProtocolError::ConnectionClosed`] — the stream ended before a
///   whole frame arrived (including a clean close between frames).
/// - [`ProtocolError::InvalidBodyLength`] — the header announced a
///   negative body length or one above [`MAX_BODY_LEN`].
/// - [`ProtocolError::Io`] — any other stream failure.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await.map_err(map_read_err)?;

    let sender_id = i32::from_le_bytes(header[0..4].try_into().unwrap());
    let opcode = i32::from_le_bytes(header[4..8].try_into().unwrap());
    let body_len = i32::from_le_bytes(header[8..12].try_into().unwrap());

    if body_len < 0 || body_len as usize > MAX_BODY_LEN {
        return Err(ProtocolError::InvalidBodyLength(body_len));
    }

    let mut body = vec![0u8; body_len as usize];
    if body_len > 0 {
        reader.read_exact(&mut body).await.map_err(map_read_err)?;
    }

    Ok(Frame {
        sender_id,
        opcode,
        body,
    })
}

/// Writes one frame to the stream, all-or-nothing.
///
/// Header and body go out as a single buffer so a frame is never
/// interleaved with another writer's bytes at this call site.
pub async fn write_frame<W>(
    writer: &mut W,
    frame: &Frame,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame.encode();
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================
