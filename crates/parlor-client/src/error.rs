//! Client-side error type.

use parlor_transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Dialing or socket setup failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The connection is gone; sends can no longer be queued.
    #[error("connection to the server is closed")]
    Disconnected,
}
