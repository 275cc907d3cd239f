//! The state mirror: an optional hook for the embedding application to
//! keep a durable copy of room state.
//!
//! The engine never reads the mirror back — the in-memory actor state is
//! authoritative for the active session. Mirror failures on single-step
//! changes (a join, a score bump) are logged and ignored. The one place
//! failure matters is the multi-step member-removal path: there the
//! prospective state is offered to the mirror *before* being committed,
//! so a rejection leaves the room exactly as it was
//! ([`RoomError::StoreFailed`](crate::RoomError::StoreFailed)).

use scrawl_protocol::{RoomId, Username};

/// One member as the mirror sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSnapshot {
    pub username: Username,
    pub score: u32,
}

/// A room's full mirrored state after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub members: Vec<MemberSnapshot>,
    pub current_drawer: Option<Username>,
    pub current_word: Option<String>,
}

/// The mirror refused or failed to record a snapshot.
#[derive(Debug, thiserror::Error)]
#[error("state mirror unavailable: {0}")]
pub struct MirrorError(pub String);

/// Receives room snapshots after each mutation.
pub trait StateMirror: Send + Sync + 'static {
    /// Records the room's state after a mutation.
    fn record(&self, snapshot: &RoomSnapshot) -> Result<(), MirrorError>;

    /// The room is gone; any mirrored state for it can be dropped.
    fn forget(&self, room_id: RoomId) -> Result<(), MirrorError>;
}

/// The default mirror: remembers nothing, never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMirror;

impl StateMirror for NoopMirror {
    fn record(&self, _snapshot: &RoomSnapshot) -> Result<(), MirrorError> {
        Ok(())
    }

    fn forget(&self, _room_id: RoomId) -> Result<(), MirrorError> {
        Ok(())
    }
}
