//! Payload shape codecs.
//!
//! Frame bodies are opaque to the frame codec; this module gives every
//! payload shape the protocol uses an explicit fixed-width encode and
//! decode function. Nothing here relies on native struct layout — each
//! field is written and read as little-endian bytes, in order.
//!
//! Shapes in use: empty, one i32, two i32s, one f32, a NUL-terminated
//! text string, and the composite [`RoomSnapshot`] record.
//!
//! Decoders are strict about length: a body that doesn't match the
//! expected shape yields [`ProtocolError::BadPayload`], which callers
//! treat as "ignore this one message", not as a connection fault.

use crate::{ClientId, ProtocolError};

/// Number of item slots each client carries.
pub const ITEM_SLOTS: usize = 4;

/// Wire sentinel for an unset item slot or character.
pub const UNSET: i32 = -1;

// ---------------------------------------------------------------------------
// Scalar shapes
// ---------------------------------------------------------------------------

/// Encodes a single i32 body.
pub fn encode_i32(value: i32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decodes a body that must be exactly one i32.
pub fn decode_i32(body: &[u8]) -> Result<i32, ProtocolError> {
    let bytes: [u8; 4] = body.try_into().map_err(|_| {
        ProtocolError::BadPayload(format!(
            "expected 4-byte i32 body, got {} bytes",
            body.len()
        ))
    })?;
    Ok(i32::from_le_bytes(bytes))
}

/// Encodes a two-i32 body (e.g. item slot + item id).
pub fn encode_i32_pair(first: i32, second: i32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8);
    buf.extend_from_slice(&first.to_le_bytes());
    buf.extend_from_slice(&second.to_le_bytes());
    buf
}

/// Decodes a body that must be exactly two i32s.
pub fn decode_i32_pair(body: &[u8]) -> Result<(i32, i32), ProtocolError> {
    if body.len() != 8 {
        return Err(ProtocolError::BadPayload(format!(
            "expected 8-byte i32 pair body, got {} bytes",
            body.len()
        )));
    }
    let first = i32::from_le_bytes(body[0..4].try_into().unwrap());
    let second = i32::from_le_bytes(body[4..8].try_into().unwrap());
    Ok((first, second))
}

/// Encodes a single f32 body.
pub fn encode_f32(value: f32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decodes a body that must be exactly one f32.
pub fn decode_f32(body: &[u8]) -> Result<f32, ProtocolError> {
    let bytes: [u8; 4] = body.try_into().map_err(|_| {
        ProtocolError::BadPayload(format!(
            "expected 4-byte f32 body, got {} bytes",
            body.len()
        ))
    })?;
    Ok(f32::from_le_bytes(bytes))
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Encodes a NUL-terminated text body.
pub fn encode_text(text: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(text.len() + 1);
    buf.extend_from_slice(text.as_bytes());
    buf.push(0);
    buf
}

/// Decodes a NUL-terminated text body.
///
/// Bytes after the first NUL are ignored (the terminator marks the end
/// of the string, not of the body).
pub fn decode_text(body: &[u8]) -> Result<String, ProtocolError> {
    let end = body.iter().position(|&b| b == 0).ok_or_else(|| {
        ProtocolError::BadPayload("text body missing NUL terminator".into())
    })?;
    String::from_utf8(body[..end].to_vec()).map_err(|_| {
        ProtocolError::BadPayload("text body is not valid UTF-8".into())
    })
}

// ---------------------------------------------------------------------------
// Room snapshot
// ---------------------------------------------------------------------------

/// Per-player entry inside a [`RoomSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    /// The player's id.
    pub id: ClientId,
    /// Whether the player has flagged ready.
    pub is_ready: bool,
    /// Item selections per slot; [`UNSET`] marks an empty slot.
    pub items: [i32; ITEM_SLOTS],
}

/// The composite room-state record sent to a newly admitted client.
///
/// Wire layout (all fields little-endian i32):
///
/// ```text
/// owner_id | map_id | player_count | { id | ready | item[0..4] } * count
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    /// Current room owner, [`ClientId::NONE`] if the room is empty.
    pub owner: ClientId,
    /// Currently selected map.
    pub map_id: i32,
    /// All registered players in connection order.
    pub players: Vec<PlayerSummary>,
}

impl RoomSnapshot {
    /// Serializes the snapshot into a frame body.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(12 + self.players.len() * 24);
        buf.extend_from_slice(&self.owner.0.to_le_bytes());
        buf.extend_from_slice(&self.map_id.to_le_bytes());
        buf.extend_from_slice(&(self.players.len() as i32).to_le_bytes());
        for player in &self.players {
            buf.extend_from_slice(&player.id.0.to_le_bytes());
            buf.extend_from_slice(
                &(if player.is_ready { 1i32 } else { 0i32 }).to_le_bytes(),
            );
            for item in &player.items {
                buf.extend_from_slice(&item.to_le_bytes());
            }
        }
        buf
    }

    /// Parses a snapshot from a frame body.
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut cursor = body;
        let owner = ClientId(take_i32(&mut cursor)?);
        let map_id = take_i32(&mut cursor)?;
        let count = take_i32(&mut cursor)?;
        if count < 0 {
            return Err(ProtocolError::BadPayload(format!(
                "snapshot player count {count} is negative"
            )));
        }
        // The count comes off the wire; refuse one the remaining body
        // cannot possibly hold before allocating for it.
        let per_player = (2 + ITEM_SLOTS) * 4;
        if count as usize > cursor.len() / per_player {
            return Err(ProtocolError::BadPayload(format!(
                "snapshot claims {count} players but only {} bytes remain",
                cursor.len()
            )));
        }

        let mut players = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = ClientId(take_i32(&mut cursor)?);
            let is_ready = take_i32(&mut cursor)? != 0;
            let mut items = [UNSET; ITEM_SLOTS];
            for slot in items.iter_mut() {
                *slot = take_i32(&mut cursor)?;
            }
            players.push(PlayerSummary {
                id,
                is_ready,
                items,
            });
        }

        if !cursor.is_empty() {
            return Err(ProtocolError::BadPayload(format!(
                "{} trailing bytes after snapshot",
                cursor.len()
            )));
        }

        Ok(Self {
            owner,
            map_id,
            players,
        })
    }
}

/// Pops one little-endian i32 off the front of a byte cursor.
fn take_i32(cursor: &mut &[u8]) -> Result<i32, ProtocolError> {
    if cursor.len() < 4 {
        return Err(ProtocolError::BadPayload(
            "snapshot body truncated".into(),
        ));
    }
    let (head, rest) = cursor.split_at(4);
    *cursor = rest;
    Ok(i32::from_le_bytes(head.try_into().unwrap()))
}

// =========================================================================
// Tests
// =========================================================================
