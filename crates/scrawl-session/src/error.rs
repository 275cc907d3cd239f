//! Error types for the session layer.

use scrawl_transport::ConnectionId;

/// Errors that can occur while tracking connections.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection already declared an identity. A second `Hello`
    /// on the same socket is a protocol violation.
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),

    /// The connection never declared an identity, so it cannot join
    /// rooms or act on them.
    #[error("connection {0} is not registered")]
    NotRegistered(ConnectionId),
}
