//! Room state management for Parlor.
//!
//! A server instance hosts exactly one [`Room`]: the registry of
//! connected clients, the room owner, the Waiting/Running game phase
//! machine, and the broadcast dispatch that fans frames out to every
//! client's writer task.
//!
//! # Key types
//!
//! - [`Room`] — the single shared state, used behind one `Mutex`
//! - [`Client`] — one registered peer's record
//! - [`RoomConfig`] / [`RoundMode`] — capacity and round policy
//! - [`GamePhase`] — the two-state round machine

mod client;
mod config;
mod error;
mod room;

pub use client::{Client, OutboundReceiver, OutboundSender};
pub use config::{GamePhase, RoomConfig, RoundMode};
pub use error::RoomError;
pub use room::Room;
