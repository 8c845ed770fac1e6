//! Per-connection handler: admission, writer task, and the receive loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Admit under the room lock → get a ClientId (or a reject frame)
//!   2. Spawn the writer task draining the client's outbound channel
//!   3. Loop: read frames → dispatch into the room under its lock
//!   4. On any read failure, run disconnect cleanup exactly once

use std::sync::Arc;

use parlor_protocol::{
    payload, read_frame, write_frame, ClientId, Frame, ProtocolError,
    ServerOpcode,
};
use parlor_room::RoomError;
use parlor_transport::TcpConnection;
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::ParlorError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: TcpConnection,
    state: Arc<ServerState>,
) -> Result<(), ParlorError> {
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    let (mut reader, mut writer) = conn.into_split();

    // Admission happens under the room lock, before anything is spawned.
    // A full room writes the reject frame on the raw socket and drops
    // the connection without registering it anywhere.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client_id = {
        let mut room = state.room.lock().await;
        match room.admit(tx) {
            Ok(id) => id,
            Err(RoomError::RoomFull(players)) => {
                drop(room);
                tracing::info!(%conn_id, players, "connection rejected, room full");
                let reject = Frame::new(
                    ClientId::SERVER,
                    ServerOpcode::ConnectedReject,
                    payload::encode_text("Room is full."),
                );
                write_frame(&mut writer, &reject).await?;
                return Ok(());
            }
        }
    };

    // Writer task: the only place this connection's socket is written.
    // The room enqueues frames on the channel while holding its lock;
    // the actual I/O happens here, outside it.
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = write_frame(&mut writer, &frame).await {
                tracing::debug!(client_id = %client_id, error = %e, "write failed");
                break;
            }
        }
    });

    // Receive loop. A clean close and a read error end it the same way;
    // the difference only matters for the log line.
    let result = loop {
        match read_frame(&mut reader).await {
            Ok(frame) => {
                let mut room = state.room.lock().await;
                room.handle_message(client_id, frame.opcode, &frame.body);
            }
            Err(ProtocolError::ConnectionClosed) => {
                tracing::info!(client_id = %client_id, "connection closed");
                break Ok(());
            }
            Err(e) => {
                tracing::debug!(client_id = %client_id, error = %e, "receive failed");
                break Err(ParlorError::Protocol(e));
            }
        }
    };

    // Cleanup runs exactly once, whichever way the loop ended.
    state.room.lock().await.handle_disconnect(client_id);
    writer_task.abort();
    result
}
