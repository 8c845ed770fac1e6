//! The lobby client: connect, send, poll.
//!
//! `ParlorClient` owns three background tasks: a writer draining the
//! outbound queue onto the socket, a receiver decoding frames into the
//! pollable inbound queue, and a heartbeat ticker. The caller's side is
//! synchronous apart from `connect`: queue a send, poll for messages.

use std::time::Duration;

use parlor_protocol::{
    read_frame, write_frame, ClientId, ClientOpcode, Frame, ProtocolError,
};
use parlor_transport::TcpConnection;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ClientError;

/// How often the background task emits a heartbeat frame.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// A connection to a Parlor lobby server.
///
/// Dropping the client tears down its background tasks and closes the
/// socket.
pub struct ParlorClient {
    outbound: mpsc::UnboundedSender<Frame>,
    inbound: mpsc::UnboundedReceiver<Frame>,
    writer_task: JoinHandle<()>,
    recv_task: JoinHandle<()>,
    heartbeat_task: JoinHandle<()>,
}

impl ParlorClient {
    /// Dials the server and starts the background tasks.
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        let conn = TcpConnection::connect(addr).await?;
        let conn_id = conn.id();
        tracing::debug!(%conn_id, addr, "connected to lobby");
        let (mut reader, mut writer) = conn.into_split();

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Frame>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        let writer_task = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = write_frame(&mut writer, &frame).await {
                    tracing::debug!(error = %e, "client write failed");
                    break;
                }
            }
        });

        let recv_task = tokio::spawn(async move {
            loop {
                match read_frame(&mut reader).await {
                    // A send failure means the client itself was
                    // dropped; nothing left to deliver to.
                    Ok(frame) => {
                        if inbound_tx.send(frame).is_err() {
                            break;
                        }
                    }
                    Err(ProtocolError::ConnectionClosed) => {
                        tracing::debug!("server closed the connection");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "client receive failed");
                        break;
                    }
                }
            }
        });

        // Heartbeats flow for the connection's lifetime. The server
        // acks each one; the acks surface through the inbound queue
        // like any other message.
        let heartbeat_out = outbound.clone();
        let heartbeat_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
            loop {
                ticker.tick().await;
                let beat = Frame::new(
                    ClientId::SERVER,
                    ClientOpcode::Heartbeat,
                    Vec::new(),
                );
                if heartbeat_out.send(beat).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            outbound,
            inbound,
            writer_task,
            recv_task,
            heartbeat_task,
        })
    }

    /// Queues one frame for the server.
    ///
    /// The sender field goes out as 0: the server identifies clients by
    /// their connection, not by what the frame claims.
    pub fn send(
        &self,
        opcode: ClientOpcode,
        body: Vec<u8>,
    ) -> Result<(), ClientError> {
        let frame = Frame::new(ClientId::SERVER, opcode, body);
        self.outbound
            .send(frame)
            .map_err(|_| ClientError::Disconnected)
    }

    /// Pops the next inbound message without waiting. `None` when the
    /// queue is empty.
    pub fn poll_message(&mut self) -> Option<Frame> {
        self.inbound.try_recv().ok()
    }

    /// Waits for the next inbound message. `None` once the connection
    /// is closed and the queue has drained.
    pub async fn next_message(&mut self) -> Option<Frame> {
        self.inbound.recv().await
    }

    /// Closes the connection.
    pub fn close(self) {
        // Drop does the work.
    }
}

impl Drop for ParlorClient {
    fn drop(&mut self) {
        self.heartbeat_task.abort();
        self.writer_task.abort();
        self.recv_task.abort();
    }
}
