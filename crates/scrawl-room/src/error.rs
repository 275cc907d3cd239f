//! Error types for the room engine.

use scrawl_protocol::{RoomId, Username};

/// Errors that can occur during room operations.
///
/// Every kind is an explicit result value returned to the caller — the
/// transport layer decides how to present them. Nothing in here is ever
/// silently swallowed.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room configuration failed validation (capacity or round
    /// duration of zero, private room without a password).
    #[error("invalid room options: {0}")]
    InvalidOptions(String),

    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The named member is not in the room.
    #[error("no member {0} in room {1}")]
    MemberNotFound(Username, RoomId),

    /// Someone other than the creator tried to delete the room.
    #[error("only the creator may delete room {0}")]
    Unauthorized(RoomId),

    /// Wrong or missing password for a private room.
    #[error("wrong password for room {0}")]
    WrongPassword(RoomId),

    /// The room is at capacity.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// Someone other than the current drawer tried to start a round.
    #[error("only the drawer may start a round")]
    NotDrawer,

    /// The word pool has nothing to draw.
    #[error("no words available")]
    NoWordsAvailable,

    /// The room's command channel is closed — the actor is gone.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The state mirror rejected a multi-step change; the room state was
    /// left exactly as it was. Transient — the caller may retry.
    #[error("state mirror rejected the change: {0}")]
    StoreFailed(String),
}
