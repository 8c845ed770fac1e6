//! Wire protocol for Parlor.
//!
//! This crate defines the language that clients and the server speak:
//!
//! - **Framing** ([`Frame`], [`read_frame`], [`write_frame`]) — the
//!   fixed 12-byte header format over a partial-delivery byte stream.
//! - **Catalogs** ([`ClientOpcode`], [`ServerOpcode`]) — the two
//!   independent message-type enumerations.
//! - **Payloads** ([`payload`]) — explicit fixed-width codecs for each
//!   body shape, including the composite [`RoomSnapshot`].
//! - **Errors** ([`ProtocolError`]) — what can go wrong on the wire.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw bytes) and the
//! room (state machine). It knows nothing about connections, clients,
//! or rooms — only how frames and payloads map to bytes.
//!
//! ```text
//! Transport (bytes) → Protocol (Frame) → Room (state transitions)
//! ```

mod error;
mod frame;
pub mod payload;
mod types;

pub use error::ProtocolError;
pub use frame::{read_frame, write_frame, Frame, HEADER_LEN, MAX_BODY_LEN};
pub use payload::{PlayerSummary, RoomSnapshot, ITEM_SLOTS, UNSET};
pub use types::{ClientId, ClientOpcode, ServerOpcode};
