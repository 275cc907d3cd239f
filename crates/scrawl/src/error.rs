//! Unified error type for the Scrawl server.

use scrawl_protocol::ProtocolError;
use scrawl_room::RoomError;
use scrawl_session::SessionError;
use scrawl_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ScrawlError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (connection registration).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, wrong password, …).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let top: ScrawlError = err.into();
        assert!(matches!(top, ScrawlError::Transport(_)));
        assert!(top.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let top: ScrawlError = err.into();
        assert!(matches!(top, ScrawlError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::NotRegistered(
            scrawl_transport::ConnectionId::new(1),
        );
        let top: ScrawlError = err.into();
        assert!(matches!(top, ScrawlError::Session(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(scrawl_protocol::RoomId(1));
        let top: ScrawlError = err.into();
        assert!(matches!(top, ScrawlError::Room(_)));
    }
}
