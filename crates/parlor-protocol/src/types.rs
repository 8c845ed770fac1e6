//! Identity and message-type catalogs for Parlor's wire format.
//!
//! Message types are small non-negative integers, numbered from zero in
//! declaration order, with one independent catalog per direction. The
//! numeric values are not a public compatibility contract — both ends
//! are implemented in this workspace — but they must stay in sync, so
//! they are pinned with explicit discriminants rather than left to the
//! compiler.

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// ClientId
// ---------------------------------------------------------------------------

/// A unique identifier for a connected client.
///
/// Newtype over the `i32` that travels in the frame header's sender
/// field. Ids are assigned monotonically from 1 on admission and never
/// reused while the server runs. Two values are reserved:
///
/// - [`ClientId::SERVER`] (0) — frames originated by the server itself.
/// - [`ClientId::NONE`] (-1) — the "no room owner" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub i32);

impl ClientId {
    /// Sender id used for frames the server originates.
    pub const SERVER: ClientId = ClientId(0);

    /// Sentinel meaning "no client" — used for an ownerless room.
    pub const NONE: ClientId = ClientId(-1);
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

impl From<ClientId> for i32 {
    fn from(id: ClientId) -> i32 {
        id.0
    }
}

// ---------------------------------------------------------------------------
// ClientOpcode — client → server catalog
// ---------------------------------------------------------------------------

/// Message types a client may send to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ClientOpcode {
    /// Periodic keep-alive, empty body. Answered with
    /// [`ServerOpcode::HeartbeatAck`]; has no effect on room state.
    Heartbeat = 0,
    /// Owner requests a round start. Empty body.
    Start = 1,
    /// Character selection. Body: one i32 (character id).
    PickCharacter = 2,
    /// Item selection. Body: two i32s (slot index, item id).
    PickItem = 3,
    /// Map selection, owner only. Body: one i32 (map id).
    PickMap = 4,
    /// Sender marks itself ready. Empty body.
    Ready = 5,
    /// Sender revokes its ready flag. Empty body.
    Unready = 6,
    /// Movement event, relayed verbatim. Empty body.
    MoveUp = 7,
    /// Movement event, relayed verbatim. Empty body.
    MoveDown = 8,
    /// Sender reports its own death. Empty body.
    PlayerDead = 9,
    /// Score submission during a running round. Body: one f32.
    SubmitScore = 10,
}

impl From<ClientOpcode> for i32 {
    fn from(op: ClientOpcode) -> i32 {
        op as i32
    }
}

impl TryFrom<i32> for ClientOpcode {
    type Error = ProtocolError;

    fn try_from(raw: i32) -> Result<Self, ProtocolError> {
        match raw {
            0 => Ok(Self::Heartbeat),
            1 => Ok(Self::Start),
            2 => Ok(Self::PickCharacter),
            3 => Ok(Self::PickItem),
            4 => Ok(Self::PickMap),
            5 => Ok(Self::Ready),
            6 => Ok(Self::Unready),
            7 => Ok(Self::MoveUp),
            8 => Ok(Self::MoveDown),
            9 => Ok(Self::PlayerDead),
            10 => Ok(Self::SubmitScore),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerOpcode — server → client catalog
// ---------------------------------------------------------------------------

/// Message types the server may send to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ServerOpcode {
    /// Admission accepted. Body: one i32, the recipient's own id.
    Connected = 0,
    /// Reply to [`ClientOpcode::Heartbeat`]. Empty body.
    HeartbeatAck = 1,
    /// A round started. Body: NUL-terminated text.
    StartAck = 2,
    /// A new peer joined. Body: one i32 (the joiner's id).
    Join = 3,
    /// A peer left. Body: one i32 (the departed id).
    Disconnect = 4,
    /// Admission refused (room full). Body: NUL-terminated text.
    ConnectedReject = 5,
    /// Informational text for display. Body: NUL-terminated text.
    Info = 6,
    /// Room ownership changed. Body: one i32 (the owner's id).
    NewOwner = 7,
    /// Snapshot of current room state, sent to a joining client.
    /// Body: composite record, see `RoomSnapshot`.
    RoomSnapshot = 8,
    /// Relayed character pick. Body: one i32.
    PickCharacter = 9,
    /// Relayed item pick. Body: two i32s (slot, item).
    PickItem = 10,
    /// Relayed map pick. Body: one i32.
    PickMap = 11,
    /// Relayed ready flag. Empty body; sender field names the client.
    Ready = 12,
    /// Relayed unready flag. Empty body.
    Unready = 13,
    /// Relayed movement. Empty body.
    MoveUp = 14,
    /// Relayed movement. Empty body.
    MoveDown = 15,
    /// Relayed death report. Empty body.
    PlayerDead = 16,
    /// Round ended (all dead, winner found, or aborted).
    /// Body: NUL-terminated text.
    GameOver = 17,
    /// Relayed score submission. Body: one f32.
    ScoreAck = 18,
    /// Per-client round outcome. Body: one i32 (1 = won, 0 = lost).
    RoundResult = 19,
}

impl From<ServerOpcode> for i32 {
    fn from(op: ServerOpcode) -> i32 {
        op as i32
    }
}

impl TryFrom<i32> for ServerOpcode {
    type Error = ProtocolError;

    fn try_from(raw: i32) -> Result<Self, ProtocolError> {
        match raw {
            0 => Ok(Self::Connected),
            1 => Ok(Self::HeartbeatAck),
            2 => Ok(Self::StartAck),
            3 => Ok(Self::Join),
            4 => Ok(Self::Disconnect),
            5 => Ok(Self::ConnectedReject),
            6 => Ok(Self::Info),
            7 => Ok(Self::NewOwner),
            8 => Ok(Self::RoomSnapshot),
            9 => Ok(Self::PickCharacter),
            10 => Ok(Self::PickItem),
            11 => Ok(Self::PickMap),
            12 => Ok(Self::Ready),
            13 => Ok(Self::Unready),
            14 => Ok(Self::MoveUp),
            15 => Ok(Self::MoveDown),
            16 => Ok(Self::PlayerDead),
            17 => Ok(Self::GameOver),
            18 => Ok(Self::ScoreAck),
            19 => Ok(Self::RoundResult),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
