//! The connection tracker: who is on each live transport connection,
//! and which room they are in.
//!
//! This is the piece that makes disconnect cleanup possible. When a
//! socket dies without a polite `Leave`, the handler asks the tracker
//! "who was that?" and runs the exact same member-removal path an
//! explicit leave would have taken.
//!
//! # Concurrency note
//!
//! `ConnectionTracker` is not thread-safe by itself — it's a plain
//! `HashMap` owned by the server state behind one mutex. Lookups and
//! updates are O(1) and never await, so that lock is always short-lived.

use std::collections::HashMap;

use scrawl_protocol::{RoomId, Username};
use scrawl_transport::ConnectionId;

use crate::SessionError;

/// What the server knows about one live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    /// The identity declared in the connection's `Hello`.
    pub username: Username,
    /// The room the connection has joined, if any.
    pub room: Option<RoomId>,
}

/// Maps live transport connections to (username, joined room).
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    connections: HashMap<ConnectionId, Presence>,
}

impl ConnectionTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the identity for a freshly announced connection.
    ///
    /// # Errors
    /// [`SessionError::AlreadyRegistered`] if this connection already
    /// declared an identity.
    pub fn register(
        &mut self,
        conn: ConnectionId,
        username: Username,
    ) -> Result<(), SessionError> {
        if self.connections.contains_key(&conn) {
            return Err(SessionError::AlreadyRegistered(conn));
        }
        tracing::debug!(%conn, %username, "connection registered");
        self.connections.insert(
            conn,
            Presence {
                username,
                room: None,
            },
        );
        Ok(())
    }

    /// Records that the connection joined a room.
    ///
    /// # Errors
    /// [`SessionError::NotRegistered`] if the connection never sent a
    /// `Hello`.
    pub fn bind_room(
        &mut self,
        conn: ConnectionId,
        room: RoomId,
    ) -> Result<(), SessionError> {
        let presence = self
            .connections
            .get_mut(&conn)
            .ok_or(SessionError::NotRegistered(conn))?;
        presence.room = Some(room);
        Ok(())
    }

    /// Clears the connection's room binding after a leave.
    ///
    /// A no-op for unknown connections — the leave/disconnect race means
    /// the entry may already be gone, and that's fine.
    pub fn clear_room(&mut self, conn: ConnectionId) {
        if let Some(presence) = self.connections.get_mut(&conn) {
            presence.room = None;
        }
    }

    /// Forgets a connection, returning what was known about it.
    ///
    /// Idempotent: removing an untracked connection yields `None` and
    /// changes nothing. The caller uses the returned [`Presence`] to run
    /// room cleanup for whatever the connection was doing.
    pub fn remove(&mut self, conn: ConnectionId) -> Option<Presence> {
        let presence = self.connections.remove(&conn);
        if let Some(p) = &presence {
            tracing::debug!(%conn, username = %p.username, "connection removed");
        }
        presence
    }

    /// Looks up a connection's presence.
    pub fn get(&self, conn: &ConnectionId) -> Option<&Presence> {
        self.connections.get(conn)
    }

    /// Returns the number of tracked connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connections are tracked.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn user(name: &str) -> Username {
        Username::from(name)
    }

    #[test]
    fn test_register_stores_presence_without_room() {
        let mut tracker = ConnectionTracker::new();

        tracker.register(conn(1), user("ala")).unwrap();

        let presence = tracker.get(&conn(1)).unwrap();
        assert_eq!(presence.username, user("ala"));
        assert_eq!(presence.room, None);
    }

    #[test]
    fn test_register_twice_returns_error() {
        let mut tracker = ConnectionTracker::new();
        tracker.register(conn(1), user("ala")).unwrap();

        let result = tracker.register(conn(1), user("bob"));

        assert!(matches!(
            result,
            Err(SessionError::AlreadyRegistered(c)) if c == conn(1)
        ));
        // The original identity must survive the rejected re-register.
        assert_eq!(tracker.get(&conn(1)).unwrap().username, user("ala"));
    }

    #[test]
    fn test_same_username_on_two_connections_is_allowed() {
        // Usernames are only unique within a room, not per server.
        let mut tracker = ConnectionTracker::new();
        tracker.register(conn(1), user("ala")).unwrap();
        tracker.register(conn(2), user("ala")).unwrap();
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_bind_room_sets_room() {
        let mut tracker = ConnectionTracker::new();
        tracker.register(conn(1), user("ala")).unwrap();

        tracker.bind_room(conn(1), RoomId(7)).unwrap();

        assert_eq!(tracker.get(&conn(1)).unwrap().room, Some(RoomId(7)));
    }

    #[test]
    fn test_bind_room_unregistered_returns_error() {
        let mut tracker = ConnectionTracker::new();
        let result = tracker.bind_room(conn(9), RoomId(1));
        assert!(matches!(result, Err(SessionError::NotRegistered(_))));
    }

    #[test]
    fn test_clear_room_resets_binding() {
        let mut tracker = ConnectionTracker::new();
        tracker.register(conn(1), user("ala")).unwrap();
        tracker.bind_room(conn(1), RoomId(7)).unwrap();

        tracker.clear_room(conn(1));

        assert_eq!(tracker.get(&conn(1)).unwrap().room, None);
    }

    #[test]
    fn test_clear_room_unknown_connection_is_noop() {
        let mut tracker = ConnectionTracker::new();
        tracker.clear_room(conn(9));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_remove_returns_presence() {
        let mut tracker = ConnectionTracker::new();
        tracker.register(conn(1), user("ala")).unwrap();
        tracker.bind_room(conn(1), RoomId(7)).unwrap();

        let presence = tracker.remove(conn(1)).unwrap();

        assert_eq!(presence.username, user("ala"));
        assert_eq!(presence.room, Some(RoomId(7)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_remove_twice_is_idempotent() {
        let mut tracker = ConnectionTracker::new();
        tracker.register(conn(1), user("ala")).unwrap();

        assert!(tracker.remove(conn(1)).is_some());
        assert!(tracker.remove(conn(1)).is_none());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_len_tracks_connection_count() {
        let mut tracker = ConnectionTracker::new();
        assert!(tracker.is_empty());

        tracker.register(conn(1), user("ala")).unwrap();
        tracker.register(conn(2), user("bob")).unwrap();
        assert_eq!(tracker.len(), 2);

        tracker.remove(conn(1));
        assert_eq!(tracker.len(), 1);
    }
}
