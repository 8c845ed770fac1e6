//! The room: sole authority over the client registry and game state.
//!
//! A server instance hosts exactly one `Room`, shared behind a single
//! `tokio::sync::Mutex`. Every read and mutation — admission, message
//! handling, disconnect handling, broadcast iteration — happens while
//! holding that lock, which serializes handler execution and gives
//! every client the same relative ordering of state-change broadcasts.
//!
//! Broadcasts themselves never touch a socket: each registered client
//! carries an unbounded channel sender, and a per-connection writer
//! task drains the channel outside the lock. A closed channel (the
//! peer's writer died) is ignored here; the peer's own receive loop
//! detects the disconnect and runs cleanup.

use std::collections::HashSet;

use parlor_protocol::{
    payload, ClientId, ClientOpcode, Frame, RoomSnapshot, ServerOpcode,
    ITEM_SLOTS,
};

use crate::{Client, GamePhase, OutboundSender, RoomConfig, RoomError, RoundMode};

/// The shared room state: registry, ownership, and phase machine.
pub struct Room {
    config: RoomConfig,
    /// Registered clients in connection order. The order is load-
    /// bearing: the front of the list is the owner's successor.
    clients: Vec<Client>,
    owner: ClientId,
    phase: GamePhase,
    map_id: i32,
    next_id: i32,
    /// Clients that reported death this round.
    dead: HashSet<ClientId>,
    /// Winner of the current round, if one has been recorded.
    winner: Option<ClientId>,
}

impl Room {
    /// Creates an empty room in the Waiting phase.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            clients: Vec::new(),
            owner: ClientId::NONE,
            phase: GamePhase::Waiting,
            map_id: 0,
            next_id: 1,
            dead: HashSet::new(),
            winner: None,
        }
    }

    // -----------------------------------------------------------------
    // Admission and departure
    // -----------------------------------------------------------------

    /// Admits a new connection.
    ///
    /// Capacity is checked first; a full room refuses without touching
    /// any state. Otherwise the next id is allocated, the client is
    /// appended (preserving connection order), and ownership is
    /// assigned if the room had none. The new client is told its id,
    /// the current owner, and a snapshot of room state; existing
    /// clients are told someone joined.
    pub fn admit(
        &mut self,
        sender: OutboundSender,
    ) -> Result<ClientId, RoomError> {
        if self.clients.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.clients.len()));
        }

        let id = ClientId(self.next_id);
        self.next_id += 1;
        self.clients.push(Client::new(id, sender));
        if self.owner == ClientId::NONE {
            self.owner = id;
        }

        self.send_to(id, Frame::new(id, ServerOpcode::Connected, payload::encode_i32(id.0)));
        self.send_to(
            id,
            Frame::new(
                ClientId::SERVER,
                ServerOpcode::NewOwner,
                payload::encode_i32(self.owner.0),
            ),
        );
        self.send_to(
            id,
            Frame::new(
                ClientId::SERVER,
                ServerOpcode::RoomSnapshot,
                self.snapshot().encode(),
            ),
        );
        self.broadcast_except(
            id,
            Frame::new(id, ServerOpcode::Join, payload::encode_i32(id.0)),
        );

        tracing::info!(
            client_id = %id,
            players = self.clients.len(),
            owner = %self.owner,
            "client admitted"
        );
        Ok(id)
    }

    /// Removes a departed client and repairs the room invariants.
    ///
    /// Called exactly once per connection, by its receive loop, after
    /// any decode failure ends the loop. Broadcasts the departure; an
    /// emptied room resets ownership and phase; a departed owner is
    /// replaced by the earliest-connected remaining client; a running
    /// round aborts when the departure violates the mode's policy.
    pub fn handle_disconnect(&mut self, id: ClientId) {
        let Some(pos) = self.clients.iter().position(|c| c.id == id) else {
            tracing::debug!(client_id = %id, "disconnect for unknown client");
            return;
        };
        let was_owner = id == self.owner;
        self.clients.remove(pos);
        self.dead.remove(&id);

        tracing::info!(
            client_id = %id,
            players = self.clients.len(),
            "client removed"
        );
        self.broadcast(Frame::new(
            id,
            ServerOpcode::Disconnect,
            payload::encode_i32(id.0),
        ));

        if self.clients.is_empty() {
            self.owner = ClientId::NONE;
            self.phase = GamePhase::Waiting;
            self.dead.clear();
            self.winner = None;
            tracing::info!("room empty, owner reset");
            return;
        }

        if was_owner {
            // Deterministic succession: earliest-connected remaining
            // client, i.e. the front of the ordered registry.
            self.owner = self.clients[0].id;
            tracing::info!(owner = %self.owner, "room owner changed");
            self.broadcast(Frame::new(
                ClientId::SERVER,
                ServerOpcode::NewOwner,
                payload::encode_i32(self.owner.0),
            ));
        }

        if self.phase.is_running() {
            let abort = match self.config.mode {
                RoundMode::Competitive => {
                    self.clients.len() < self.config.min_players
                }
                RoundMode::Survival => self.alive_count() == 0,
            };
            if abort {
                self.end_round("Round aborted: not enough players.");
            }
        }
    }

    // -----------------------------------------------------------------
    // Message dispatch
    // -----------------------------------------------------------------

    /// Dispatches one decoded frame from a client.
    ///
    /// `opcode` arrives raw off the wire; values outside the catalog
    /// are logged and ignored, as are bodies whose shape doesn't match
    /// the opcode and messages whose preconditions fail. None of those
    /// are fatal to the connection.
    pub fn handle_message(&mut self, id: ClientId, opcode: i32, body: &[u8]) {
        let opcode = match ClientOpcode::try_from(opcode) {
            Ok(op) => op,
            Err(_) => {
                tracing::debug!(client_id = %id, opcode, "unknown opcode ignored");
                return;
            }
        };
        if !self.contains(id) {
            tracing::warn!(client_id = %id, "message from unregistered client");
            return;
        }

        match opcode {
            ClientOpcode::Heartbeat => {
                self.send_to(
                    id,
                    Frame::new(id, ServerOpcode::HeartbeatAck, Vec::new()),
                );
            }
            ClientOpcode::Start => self.handle_start(id),
            ClientOpcode::Ready => self.handle_ready(id, true),
            ClientOpcode::Unready => self.handle_ready(id, false),
            ClientOpcode::PickCharacter => self.handle_pick_character(id, body),
            ClientOpcode::PickItem => self.handle_pick_item(id, body),
            ClientOpcode::PickMap => self.handle_pick_map(id, body),
            ClientOpcode::MoveUp => {
                self.broadcast(Frame::new(id, ServerOpcode::MoveUp, Vec::new()));
            }
            ClientOpcode::MoveDown => {
                self.broadcast(Frame::new(id, ServerOpcode::MoveDown, Vec::new()));
            }
            ClientOpcode::PlayerDead => self.handle_player_dead(id),
            ClientOpcode::SubmitScore => self.handle_submit_score(id, body),
        }
    }

    fn handle_start(&mut self, id: ClientId) {
        if id != self.owner {
            tracing::debug!(client_id = %id, "start from non-owner ignored");
            return;
        }
        if self.clients.len() < self.config.min_players {
            tracing::debug!(
                players = self.clients.len(),
                min = self.config.min_players,
                "start with too few players ignored"
            );
            return;
        }
        if self.phase.is_running() {
            tracing::debug!("start while running ignored");
            return;
        }

        self.phase = GamePhase::Running;
        for client in &mut self.clients {
            client.is_alive = true;
        }
        self.dead.clear();
        self.winner = None;

        self.broadcast(Frame::new(
            id,
            ServerOpcode::StartAck,
            payload::encode_text("Game Started!"),
        ));
        tracing::info!(owner = %id, players = self.clients.len(), "game started");
    }

    fn handle_ready(&mut self, id: ClientId, ready: bool) {
        let Some(client) = self.client_mut(id) else { return };
        client.is_ready = ready;
        let echo = if ready {
            ServerOpcode::Ready
        } else {
            ServerOpcode::Unready
        };
        self.broadcast(Frame::new(id, echo, Vec::new()));
        tracing::info!(client_id = %id, ready, "ready flag changed");

        // Courtesy nudge: tell the owner once everyone else is ready.
        if ready && self.clients.len() > 1 {
            let all_ready = self
                .clients
                .iter()
                .filter(|c| c.id != self.owner)
                .all(|c| c.is_ready);
            if all_ready {
                self.send_to(
                    self.owner,
                    Frame::new(
                        ClientId::SERVER,
                        ServerOpcode::Info,
                        payload::encode_text("All players are ready."),
                    ),
                );
            }
        }
    }

    fn handle_pick_character(&mut self, id: ClientId, body: &[u8]) {
        let character = match payload::decode_i32(body) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(client_id = %id, error = %e, "bad PickCharacter body");
                return;
            }
        };
        if let Some(client) = self.client_mut(id) {
            client.character_id = Some(character);
        }
        self.broadcast(Frame::new(
            id,
            ServerOpcode::PickCharacter,
            payload::encode_i32(character),
        ));
        tracing::info!(client_id = %id, character, "character picked");
    }

    fn handle_pick_item(&mut self, id: ClientId, body: &[u8]) {
        let (slot, item) = match payload::decode_i32_pair(body) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(client_id = %id, error = %e, "bad PickItem body");
                return;
            }
        };
        if slot < 0 || slot as usize >= ITEM_SLOTS {
            tracing::debug!(client_id = %id, slot, "item slot out of range");
            return;
        }
        if let Some(client) = self.client_mut(id) {
            client.items[slot as usize] = Some(item);
        }
        self.broadcast(Frame::new(
            id,
            ServerOpcode::PickItem,
            payload::encode_i32_pair(slot, item),
        ));
        tracing::info!(client_id = %id, slot, item, "item picked");
    }

    fn handle_pick_map(&mut self, id: ClientId, body: &[u8]) {
        if id != self.owner {
            tracing::debug!(client_id = %id, "map pick from non-owner ignored");
            return;
        }
        let map = match payload::decode_i32(body) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(client_id = %id, error = %e, "bad PickMap body");
                return;
            }
        };
        self.map_id = map;
        self.broadcast(Frame::new(
            ClientId::SERVER,
            ServerOpcode::PickMap,
            payload::encode_i32(map),
        ));
        tracing::info!(map, "map changed");
    }

    fn handle_player_dead(&mut self, id: ClientId) {
        if let Some(client) = self.client_mut(id) {
            client.is_alive = false;
        }
        self.dead.insert(id);
        self.broadcast(Frame::new(id, ServerOpcode::PlayerDead, Vec::new()));
        tracing::info!(client_id = %id, "player dead");

        // The all-dead check only ends a running round; a round that
        // already ended cannot produce a second game-over broadcast.
        if self.phase.is_running() && self.alive_count() == 0 {
            self.end_round("All players dead. Game over.");
        }
    }

    fn handle_submit_score(&mut self, id: ClientId, body: &[u8]) {
        if !self.phase.is_running() {
            tracing::debug!(client_id = %id, "score outside a round ignored");
            return;
        }
        let value = match payload::decode_f32(body) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(client_id = %id, error = %e, "bad SubmitScore body");
                return;
            }
        };

        self.broadcast(Frame::new(
            id,
            ServerOpcode::ScoreAck,
            payload::encode_f32(value),
        ));

        if value >= self.config.win_threshold && self.winner.is_none() {
            self.winner = Some(id);
            tracing::info!(client_id = %id, value, "round won");
            self.end_round(&format!("Round over. Winner: client {}.", id.0));
            for client in &self.clients {
                let won = client.id == id;
                self.send_to(
                    client.id,
                    Frame::new(
                        ClientId::SERVER,
                        ServerOpcode::RoundResult,
                        payload::encode_i32(if won { 1 } else { 0 }),
                    ),
                );
            }
        }
    }

    /// Transitions Running → Waiting and announces the round's end.
    fn end_round(&mut self, notice: &str) {
        self.phase = GamePhase::Waiting;
        self.broadcast(Frame::new(
            ClientId::SERVER,
            ServerOpcode::GameOver,
            payload::encode_text(notice),
        ));
        tracing::info!(notice, "round ended");
    }

    // -----------------------------------------------------------------
    // Dispatch primitives
    // -----------------------------------------------------------------

    /// Best-effort send to every registered client.
    ///
    /// A closed channel never aborts delivery to the others and never
    /// triggers disconnect handling here — each connection's own
    /// receive loop detects that independently.
    pub fn broadcast(&self, frame: Frame) {
        for client in &self.clients {
            let _ = client.sender.send(frame.clone());
        }
    }

    /// Broadcast to everyone except one client.
    pub fn broadcast_except(&self, excluded: ClientId, frame: Frame) {
        for client in &self.clients {
            if client.id != excluded {
                let _ = client.sender.send(frame.clone());
            }
        }
    }

    /// Sends to exactly one client, logging if it no longer exists.
    pub fn send_to(&self, id: ClientId, frame: Frame) {
        match self.clients.iter().find(|c| c.id == id) {
            Some(client) => {
                let _ = client.sender.send(frame);
            }
            None => {
                tracing::debug!(client_id = %id, "unicast to missing client dropped");
            }
        }
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// `true` if no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// The current owner, [`ClientId::NONE`] if the room is empty.
    pub fn owner(&self) -> ClientId {
        self.owner
    }

    /// The current game phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// The currently selected map.
    pub fn map_id(&self) -> i32 {
        self.map_id
    }

    /// The recorded winner of the current round, if any.
    pub fn winner(&self) -> Option<ClientId> {
        self.winner
    }

    /// `true` if the given id is registered.
    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.iter().any(|c| c.id == id)
    }

    /// Registered clients in connection order.
    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter()
    }

    /// Builds the composite state record sent to a joining client.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            owner: self.owner,
            map_id: self.map_id,
            players: self.clients.iter().map(Client::summary).collect(),
        }
    }

    fn client_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.id == id)
    }

    fn alive_count(&self) -> usize {
        self.clients.iter().filter(|c| c.is_alive).count()
    }
}
