/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener socket failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Accepting an incoming connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Connecting to a remote server failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),
}
