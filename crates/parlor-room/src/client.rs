//! The per-client record owned by the room registry.

use parlor_protocol::{ClientId, Frame, PlayerSummary, ITEM_SLOTS, UNSET};
use tokio::sync::mpsc;

/// Channel sender for delivering outbound frames to one client's
/// writer task. Stored in the registry so broadcasts never touch a
/// socket directly (and never block under the room lock).
pub type OutboundSender = mpsc::UnboundedSender<Frame>;

/// Receiving end of a client's outbound channel, drained by its
/// writer task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Frame>;

/// One connected peer, as the room sees it.
///
/// Owned exclusively by the registry for its whole lifetime: created
/// on admission, mutated under the room lock, removed on disconnect.
/// Connection handlers only ever hold the [`ClientId`].
#[derive(Debug)]
pub struct Client {
    /// Unique id, assigned monotonically, never reused.
    pub id: ClientId,
    /// Lobby ready flag.
    pub is_ready: bool,
    /// Alive within the current round.
    pub is_alive: bool,
    /// Selected character, if any.
    pub character_id: Option<i32>,
    /// Item selections per slot.
    pub items: [Option<i32>; ITEM_SLOTS],
    /// Outbound frame channel to this client's writer task.
    pub(crate) sender: OutboundSender,
}

impl Client {
    pub(crate) fn new(id: ClientId, sender: OutboundSender) -> Self {
        Self {
            id,
            is_ready: false,
            is_alive: true,
            character_id: None,
            items: [None; ITEM_SLOTS],
            sender,
        }
    }

    /// Projects this record into its wire snapshot form.
    pub fn summary(&self) -> PlayerSummary {
        let mut items = [UNSET; ITEM_SLOTS];
        for (slot, item) in self.items.iter().enumerate() {
            if let Some(item) = item {
                items[slot] = *item;
            }
        }
        PlayerSummary {
            id: self.id,
            is_ready: self.is_ready,
            items,
        }
    }
}
