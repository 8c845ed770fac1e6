//! Client library for the Parlor lobby server.
//!
//! Wraps the framed TCP protocol in a small async client: a background
//! receive task feeds a pollable message queue, a heartbeat task keeps
//! the connection announced, and [`ParlorClient::send`] queues outbound
//! frames. Presentation (rendering the lobby, reading input) is the
//! caller's business.

mod client;
mod error;

pub use client::{ParlorClient, HEARTBEAT_INTERVAL};
pub use error::ClientError;
