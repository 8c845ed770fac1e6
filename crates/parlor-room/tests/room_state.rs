//! Integration tests for the room registry, ownership, and phase machine.
//!
//! The room dispatches frames onto per-client channels, so every test
//! inspects delivery by draining the receiving end.

use parlor_protocol::{
    payload, ClientId, ClientOpcode, Frame, RoomSnapshot, ServerOpcode,
};
use parlor_room::{
    GamePhase, OutboundReceiver, Room, RoomConfig, RoomError, RoundMode,
};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn join(room: &mut Room) -> (ClientId, OutboundReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = room.admit(tx).expect("room should have space");
    (id, rx)
}

fn drain(rx: &mut OutboundReceiver) -> Vec<Frame> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        out.push(frame);
    }
    out
}

fn opcodes(frames: &[Frame]) -> Vec<i32> {
    frames.iter().map(|f| f.opcode).collect()
}

fn count_op(frames: &[Frame], op: ServerOpcode) -> usize {
    frames.iter().filter(|f| f.opcode == i32::from(op)).count()
}

fn send(room: &mut Room, id: ClientId, op: ClientOpcode, body: Vec<u8>) {
    room.handle_message(id, op.into(), &body);
}

// =========================================================================
// Admission
// =========================================================================

#[test]
fn test_ids_are_monotonic_and_first_client_owns_the_room() {
    let mut room = Room::new(RoomConfig::default());
    let (a, _rx_a) = join(&mut room);
    let (b, _rx_b) = join(&mut room);
    assert_eq!(a, ClientId(1));
    assert_eq!(b, ClientId(2));
    assert_eq!(room.owner(), a);
}

#[test]
fn test_admission_notifies_joiner_and_peers() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    drain(&mut rx_a);

    let (b, mut rx_b) = join(&mut room);

    // The new client: Connected(own id), NewOwner, RoomSnapshot.
    let frames = drain(&mut rx_b);
    assert_eq!(
        opcodes(&frames),
        vec![
            ServerOpcode::Connected.into(),
            ServerOpcode::NewOwner.into(),
            ServerOpcode::RoomSnapshot.into(),
        ]
    );
    assert_eq!(payload::decode_i32(&frames[0].body).unwrap(), b.0);
    assert_eq!(payload::decode_i32(&frames[1].body).unwrap(), a.0);
    let snapshot = RoomSnapshot::decode(&frames[2].body).unwrap();
    assert_eq!(snapshot.owner, a);
    assert_eq!(snapshot.players.len(), 2);
    assert_eq!(snapshot.players[0].id, a);
    assert_eq!(snapshot.players[1].id, b);

    // The existing client: Join carrying the new id.
    let frames = drain(&mut rx_a);
    assert_eq!(opcodes(&frames), vec![i32::from(ServerOpcode::Join)]);
    assert_eq!(payload::decode_i32(&frames[0].body).unwrap(), b.0);
}

#[test]
fn test_capacity_is_enforced_until_a_slot_frees() {
    let config = RoomConfig {
        max_players: 2,
        ..RoomConfig::default()
    };
    let mut room = Room::new(config);
    let (_a, _rx_a) = join(&mut room);
    let (b, _rx_b) = join(&mut room);

    let (tx, _rx) = mpsc::unbounded_channel();
    assert!(matches!(room.admit(tx), Err(RoomError::RoomFull(2))));
    assert_eq!(room.len(), 2);

    // A departure frees the slot; the new id is fresh, never reused.
    room.handle_disconnect(b);
    let (c, _rx_c) = join(&mut room);
    assert_eq!(c, ClientId(3));
}

// =========================================================================
// Ownership
// =========================================================================

#[test]
fn test_owner_is_none_iff_room_is_empty() {
    let mut room = Room::new(RoomConfig::default());
    assert_eq!(room.owner(), ClientId::NONE);

    let (a, _rx_a) = join(&mut room);
    let (b, _rx_b) = join(&mut room);
    assert_eq!(room.owner(), a);

    room.handle_disconnect(a);
    assert_eq!(room.owner(), b);
    assert!(room.contains(room.owner()));

    room.handle_disconnect(b);
    assert!(room.is_empty());
    assert_eq!(room.owner(), ClientId::NONE);
}

#[test]
fn test_owner_succession_is_earliest_connected() {
    let mut room = Room::new(RoomConfig::default());
    let (a, _rx_a) = join(&mut room);
    let (b, _rx_b) = join(&mut room);
    let (c, _rx_c) = join(&mut room);

    // Remove the middle client first: ownership must not move.
    room.handle_disconnect(b);
    assert_eq!(room.owner(), a);

    // Now the owner leaves: the earliest remaining client inherits.
    room.handle_disconnect(a);
    assert_eq!(room.owner(), c);
}

#[test]
fn test_owner_departure_broadcasts_new_owner() {
    let mut room = Room::new(RoomConfig::default());
    let (a, _rx_a) = join(&mut room);
    let (b, mut rx_b) = join(&mut room);
    drain(&mut rx_b);

    room.handle_disconnect(a);
    let frames = drain(&mut rx_b);
    assert_eq!(count_op(&frames, ServerOpcode::Disconnect), 1);
    assert_eq!(count_op(&frames, ServerOpcode::NewOwner), 1);
    let new_owner = frames
        .iter()
        .find(|f| f.opcode == i32::from(ServerOpcode::NewOwner))
        .unwrap();
    assert_eq!(payload::decode_i32(&new_owner.body).unwrap(), b.0);
}

// =========================================================================
// Start preconditions and the phase machine
// =========================================================================

#[test]
fn test_start_from_non_owner_never_changes_phase() {
    let mut room = Room::new(RoomConfig::default());
    let (_a, _rx_a) = join(&mut room);
    let (b, mut rx_b) = join(&mut room);
    drain(&mut rx_b);

    send(&mut room, b, ClientOpcode::Start, Vec::new());
    assert_eq!(room.phase(), GamePhase::Waiting);
    assert_eq!(count_op(&drain(&mut rx_b), ServerOpcode::StartAck), 0);
}

#[test]
fn test_start_below_minimum_never_changes_phase() {
    let mut room = Room::new(RoomConfig::default());
    let (a, _rx_a) = join(&mut room);

    send(&mut room, a, ClientOpcode::Start, Vec::new());
    assert_eq!(room.phase(), GamePhase::Waiting);
}

#[test]
fn test_owner_start_broadcasts_ack_to_everyone() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    let (_b, mut rx_b) = join(&mut room);
    drain(&mut rx_a);
    drain(&mut rx_b);

    send(&mut room, a, ClientOpcode::Start, Vec::new());
    assert_eq!(room.phase(), GamePhase::Running);

    for rx in [&mut rx_a, &mut rx_b] {
        let frames = drain(rx);
        assert_eq!(count_op(&frames, ServerOpcode::StartAck), 1);
        let ack = &frames[0];
        assert_eq!(ack.sender_id, a.0);
        assert_eq!(payload::decode_text(&ack.body).unwrap(), "Game Started!");
    }
}

#[test]
fn test_start_while_running_is_ignored() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    let (_b, _rx_b) = join(&mut room);
    drain(&mut rx_a);

    send(&mut room, a, ClientOpcode::Start, Vec::new());
    send(&mut room, a, ClientOpcode::Start, Vec::new());
    assert_eq!(count_op(&drain(&mut rx_a), ServerOpcode::StartAck), 1);
}

#[test]
fn test_start_resets_per_round_state() {
    let mut room = Room::new(RoomConfig::default());
    let (a, _rx_a) = join(&mut room);
    let (b, _rx_b) = join(&mut room);
    let (c, _rx_c) = join(&mut room);

    send(&mut room, a, ClientOpcode::Start, Vec::new());
    send(&mut room, b, ClientOpcode::PlayerDead, Vec::new());
    assert!(!room.clients().find(|cl| cl.id == b).unwrap().is_alive);

    // Let the round end, then start a fresh one: the flags must reset.
    send(&mut room, c, ClientOpcode::PlayerDead, Vec::new());
    send(&mut room, a, ClientOpcode::PlayerDead, Vec::new());
    assert_eq!(room.phase(), GamePhase::Waiting);

    send(&mut room, a, ClientOpcode::Start, Vec::new());
    assert_eq!(room.phase(), GamePhase::Running);
    assert!(room.clients().all(|c| c.is_alive));
}

// =========================================================================
// Deaths and game over
// =========================================================================

#[test]
fn test_all_dead_yields_exactly_one_game_over() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    let (b, _rx_b) = join(&mut room);
    let (c, _rx_c) = join(&mut room);
    send(&mut room, a, ClientOpcode::Start, Vec::new());
    drain(&mut rx_a);

    send(&mut room, a, ClientOpcode::PlayerDead, Vec::new());
    send(&mut room, b, ClientOpcode::PlayerDead, Vec::new());
    send(&mut room, c, ClientOpcode::PlayerDead, Vec::new());

    let frames = drain(&mut rx_a);
    assert_eq!(count_op(&frames, ServerOpcode::PlayerDead), 3);
    assert_eq!(count_op(&frames, ServerOpcode::GameOver), 1);
    assert_eq!(room.phase(), GamePhase::Waiting);
}

#[test]
fn test_player_dead_outside_a_round_never_ends_one() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    drain(&mut rx_a);

    send(&mut room, a, ClientOpcode::PlayerDead, Vec::new());
    let frames = drain(&mut rx_a);
    assert_eq!(count_op(&frames, ServerOpcode::PlayerDead), 1);
    assert_eq!(count_op(&frames, ServerOpcode::GameOver), 0);
}

// =========================================================================
// Lobby selections
// =========================================================================

#[test]
fn test_ready_flag_is_stored_and_relayed() {
    let mut room = Room::new(RoomConfig::default());
    let (_a, mut rx_a) = join(&mut room);
    let (b, _rx_b) = join(&mut room);
    drain(&mut rx_a);

    send(&mut room, b, ClientOpcode::Ready, Vec::new());
    assert!(room.clients().find(|c| c.id == b).unwrap().is_ready);

    let frames = drain(&mut rx_a);
    assert_eq!(count_op(&frames, ServerOpcode::Ready), 1);
    assert_eq!(frames[0].sender_id, b.0);
    // b was the only non-owner, so the owner gets the all-ready nudge.
    assert_eq!(count_op(&frames, ServerOpcode::Info), 1);

    send(&mut room, b, ClientOpcode::Unready, Vec::new());
    assert!(!room.clients().find(|c| c.id == b).unwrap().is_ready);
    assert_eq!(count_op(&drain(&mut rx_a), ServerOpcode::Unready), 1);
}

#[test]
fn test_character_pick_is_stored_and_relayed() {
    let mut room = Room::new(RoomConfig::default());
    let (a, _rx_a) = join(&mut room);
    let (_b, mut rx_b) = join(&mut room);
    drain(&mut rx_b);

    send(&mut room, a, ClientOpcode::PickCharacter, payload::encode_i32(7));
    assert_eq!(
        room.clients().find(|c| c.id == a).unwrap().character_id,
        Some(7)
    );
    let frames = drain(&mut rx_b);
    assert_eq!(count_op(&frames, ServerOpcode::PickCharacter), 1);
    assert_eq!(frames[0].sender_id, a.0);
    assert_eq!(payload::decode_i32(&frames[0].body).unwrap(), 7);
}

#[test]
fn test_malformed_character_body_is_ignored() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    drain(&mut rx_a);

    send(&mut room, a, ClientOpcode::PickCharacter, vec![1, 2]);
    assert_eq!(room.clients().next().unwrap().character_id, None);
    assert!(drain(&mut rx_a).is_empty());
    // The connection stays usable.
    send(&mut room, a, ClientOpcode::Heartbeat, Vec::new());
    assert_eq!(
        count_op(&drain(&mut rx_a), ServerOpcode::HeartbeatAck),
        1
    );
}

#[test]
fn test_item_pick_validates_slot_range() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    drain(&mut rx_a);

    send(&mut room, a, ClientOpcode::PickItem, payload::encode_i32_pair(9, 3));
    assert!(drain(&mut rx_a).is_empty());

    send(&mut room, a, ClientOpcode::PickItem, payload::encode_i32_pair(2, 3));
    assert_eq!(room.clients().next().unwrap().items[2], Some(3));
    let frames = drain(&mut rx_a);
    assert_eq!(count_op(&frames, ServerOpcode::PickItem), 1);
    assert_eq!(
        payload::decode_i32_pair(&frames[0].body).unwrap(),
        (2, 3)
    );
}

#[test]
fn test_map_pick_is_owner_only() {
    let mut room = Room::new(RoomConfig::default());
    let (a, _rx_a) = join(&mut room);
    let (b, mut rx_b) = join(&mut room);
    drain(&mut rx_b);

    send(&mut room, b, ClientOpcode::PickMap, payload::encode_i32(4));
    assert_eq!(room.map_id(), 0);
    assert!(drain(&mut rx_b).is_empty());

    send(&mut room, a, ClientOpcode::PickMap, payload::encode_i32(4));
    assert_eq!(room.map_id(), 4);
    let frames = drain(&mut rx_b);
    assert_eq!(count_op(&frames, ServerOpcode::PickMap), 1);
    assert_eq!(frames[0].sender_id, ClientId::SERVER.0);
}

#[test]
fn test_moves_are_relayed_without_state_change() {
    let mut room = Room::new(RoomConfig::default());
    let (a, _rx_a) = join(&mut room);
    let (_b, mut rx_b) = join(&mut room);
    drain(&mut rx_b);

    send(&mut room, a, ClientOpcode::MoveUp, Vec::new());
    send(&mut room, a, ClientOpcode::MoveDown, Vec::new());
    let frames = drain(&mut rx_b);
    assert_eq!(
        opcodes(&frames),
        vec![
            ServerOpcode::MoveUp.into(),
            ServerOpcode::MoveDown.into(),
        ]
    );
    assert!(frames.iter().all(|f| f.sender_id == a.0));
}

// =========================================================================
// Score submissions
// =========================================================================

#[test]
fn test_score_outside_a_round_is_ignored() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    drain(&mut rx_a);

    send(&mut room, a, ClientOpcode::SubmitScore, payload::encode_f32(50.0));
    assert!(drain(&mut rx_a).is_empty());
}

#[test]
fn test_score_below_threshold_is_acked_only() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    let (_b, _rx_b) = join(&mut room);
    send(&mut room, a, ClientOpcode::Start, Vec::new());
    drain(&mut rx_a);

    send(&mut room, a, ClientOpcode::SubmitScore, payload::encode_f32(50.0));
    let frames = drain(&mut rx_a);
    assert_eq!(count_op(&frames, ServerOpcode::ScoreAck), 1);
    assert_eq!(count_op(&frames, ServerOpcode::GameOver), 0);
    assert_eq!(room.phase(), GamePhase::Running);
    assert_eq!(room.winner(), None);
}

#[test]
fn test_winning_score_ends_the_round_with_results() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    let (b, mut rx_b) = join(&mut room);
    send(&mut room, a, ClientOpcode::Start, Vec::new());
    drain(&mut rx_a);
    drain(&mut rx_b);

    send(&mut room, b, ClientOpcode::SubmitScore, payload::encode_f32(120.5));

    assert_eq!(room.winner(), Some(b));
    assert_eq!(room.phase(), GamePhase::Waiting);

    let frames_a = drain(&mut rx_a);
    assert_eq!(count_op(&frames_a, ServerOpcode::ScoreAck), 1);
    assert_eq!(count_op(&frames_a, ServerOpcode::GameOver), 1);
    let result_a = frames_a
        .iter()
        .find(|f| f.opcode == i32::from(ServerOpcode::RoundResult))
        .unwrap();
    assert_eq!(payload::decode_i32(&result_a.body).unwrap(), 0);

    let frames_b = drain(&mut rx_b);
    let result_b = frames_b
        .iter()
        .find(|f| f.opcode == i32::from(ServerOpcode::RoundResult))
        .unwrap();
    assert_eq!(payload::decode_i32(&result_b.body).unwrap(), 1);

    // The round is over: further submissions are dropped.
    send(&mut room, a, ClientOpcode::SubmitScore, payload::encode_f32(500.0));
    assert!(drain(&mut rx_a).is_empty());
    assert_eq!(room.winner(), Some(b));
}

// =========================================================================
// Disconnect abort policy
// =========================================================================

#[test]
fn test_competitive_round_aborts_below_minimum() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    let (b, _rx_b) = join(&mut room);
    send(&mut room, a, ClientOpcode::Start, Vec::new());
    drain(&mut rx_a);

    room.handle_disconnect(b);
    assert_eq!(room.phase(), GamePhase::Waiting);
    assert_eq!(count_op(&drain(&mut rx_a), ServerOpcode::GameOver), 1);
}

#[test]
fn test_survival_round_survives_departures_while_anyone_lives() {
    let config = RoomConfig {
        mode: RoundMode::Survival,
        ..RoomConfig::default()
    };
    let mut room = Room::new(config);
    let (a, mut rx_a) = join(&mut room);
    let (b, _rx_b) = join(&mut room);
    let (c, _rx_c) = join(&mut room);
    send(&mut room, a, ClientOpcode::Start, Vec::new());
    drain(&mut rx_a);

    // Down to one registered player, but they're alive: keep running.
    room.handle_disconnect(b);
    room.handle_disconnect(c);
    assert_eq!(room.phase(), GamePhase::Running);

    // The last alive player dies: round over.
    send(&mut room, a, ClientOpcode::PlayerDead, Vec::new());
    assert_eq!(room.phase(), GamePhase::Waiting);
    assert_eq!(count_op(&drain(&mut rx_a), ServerOpcode::GameOver), 1);
}

#[test]
fn test_survival_round_aborts_when_last_alive_player_leaves() {
    let config = RoomConfig {
        mode: RoundMode::Survival,
        ..RoomConfig::default()
    };
    let mut room = Room::new(config);
    let (a, _rx_a) = join(&mut room);
    let (b, mut rx_b) = join(&mut room);
    let (c, _rx_c) = join(&mut room);
    send(&mut room, a, ClientOpcode::Start, Vec::new());

    send(&mut room, b, ClientOpcode::PlayerDead, Vec::new());
    send(&mut room, c, ClientOpcode::PlayerDead, Vec::new());
    assert_eq!(room.phase(), GamePhase::Running);
    drain(&mut rx_b);

    room.handle_disconnect(a);
    assert_eq!(room.phase(), GamePhase::Waiting);
    assert_eq!(count_op(&drain(&mut rx_b), ServerOpcode::GameOver), 1);
}

// =========================================================================
// Robustness
// =========================================================================

#[test]
fn test_heartbeat_is_acked_to_sender_only() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    let (_b, mut rx_b) = join(&mut room);
    drain(&mut rx_a);
    drain(&mut rx_b);

    send(&mut room, a, ClientOpcode::Heartbeat, Vec::new());
    assert_eq!(count_op(&drain(&mut rx_a), ServerOpcode::HeartbeatAck), 1);
    assert!(drain(&mut rx_b).is_empty());
}

#[test]
fn test_unknown_opcode_is_ignored() {
    let mut room = Room::new(RoomConfig::default());
    let (a, mut rx_a) = join(&mut room);
    drain(&mut rx_a);

    room.handle_message(a, 999, &[]);
    assert!(drain(&mut rx_a).is_empty());
}

#[test]
fn test_message_from_unregistered_client_is_ignored() {
    let mut room = Room::new(RoomConfig::default());
    let (_a, mut rx_a) = join(&mut room);
    drain(&mut rx_a);

    room.handle_message(
        ClientId(42),
        ClientOpcode::Ready.into(),
        &[],
    );
    assert!(drain(&mut rx_a).is_empty());
}

#[test]
fn test_disconnect_for_unknown_client_is_a_no_op() {
    let mut room = Room::new(RoomConfig::default());
    let (_a, mut rx_a) = join(&mut room);
    drain(&mut rx_a);

    room.handle_disconnect(ClientId(42));
    assert_eq!(room.len(), 1);
    assert!(drain(&mut rx_a).is_empty());
}

// =========================================================================
// End-to-end lobby scenario (spec walkthrough)
// =========================================================================

#[test]
fn test_two_client_ownership_handoff_scenario() {
    let mut room = Room::new(RoomConfig::default());

    // A connects: gets id 1, becomes owner.
    let (a, mut rx_a) = join(&mut room);
    assert_eq!(a, ClientId(1));
    assert_eq!(room.owner(), a);

    // B connects: gets id 2.
    let (b, mut rx_b) = join(&mut room);
    assert_eq!(b, ClientId(2));
    drain(&mut rx_a);
    drain(&mut rx_b);

    // A starts: both receive the start ack.
    send(&mut room, a, ClientOpcode::Start, Vec::new());
    assert_eq!(count_op(&drain(&mut rx_a), ServerOpcode::StartAck), 1);
    assert_eq!(count_op(&drain(&mut rx_b), ServerOpcode::StartAck), 1);

    // A disconnects: B is promoted and observes the new owner.
    room.handle_disconnect(a);
    assert_eq!(room.owner(), b);
    let frames = drain(&mut rx_b);
    assert_eq!(count_op(&frames, ServerOpcode::NewOwner), 1);

    // B disconnects: the room is empty and ownerless.
    room.handle_disconnect(b);
    assert!(room.is_empty());
    assert_eq!(room.owner(), ClientId::NONE);
    assert_eq!(room.phase(), GamePhase::Waiting);
}
