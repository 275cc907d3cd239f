//! Room registry: creates, finds, and destroys rooms.
//!
//! The registry holds only the id → handle map behind a short-lived
//! lock. All intra-room logic runs in the room actors, so operations on
//! different rooms never block each other.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use scrawl_protocol::{RoomId, RoomListEntry, ServerEvent, Username};
use scrawl_words::WordPool;
use tokio::sync::broadcast;

use crate::room::spawn_room;
use crate::store::StateMirror;
use crate::{LeaveOutcome, RoomError, RoomHandle, RoomOptions};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Capacity of the registry-wide lobby event channel.
const LOBBY_CHANNEL_SIZE: usize = 64;

/// Owns the room-id → handle map and the lobby notification channel.
///
/// This is the entry point for everything room-related from the
/// connection handlers. It is internally synchronized and meant to live
/// in an `Arc`.
pub struct RoomRegistry {
    /// Active rooms, keyed by room ID. Locked only for insert, remove,
    /// and lookup — never across an await.
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,

    /// Registry-wide notifications (room deletions) for listeners that
    /// are not in any room, e.g. lobby views.
    lobby: broadcast::Sender<ServerEvent>,

    words: Arc<dyn WordPool>,
    mirror: Arc<dyn StateMirror>,
}

impl RoomRegistry {
    /// Creates an empty registry over the given word pool and mirror.
    pub fn new(
        words: Arc<dyn WordPool>,
        mirror: Arc<dyn StateMirror>,
    ) -> Self {
        let (lobby, _) = broadcast::channel(LOBBY_CHANNEL_SIZE);
        Self {
            rooms: Mutex::new(HashMap::new()),
            lobby,
            words,
            mirror,
        }
    }

    /// Creates a new room and returns its ID.
    ///
    /// # Errors
    /// [`RoomError::InvalidOptions`] when the capacity or round duration
    /// is zero, or a private room has no password.
    pub fn create_room(
        &self,
        options: RoomOptions,
    ) -> Result<RoomId, RoomError> {
        let settings = options.into_settings()?;
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room(
            room_id,
            settings,
            Arc::clone(&self.words),
            Arc::clone(&self.mirror),
            DEFAULT_CHANNEL_SIZE,
        );
        self.lock_rooms().insert(room_id, handle);
        tracing::info!(%room_id, "room created");
        Ok(room_id)
    }

    /// Looks up a room's handle.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if no such room exists.
    pub fn handle(&self, room_id: RoomId) -> Result<RoomHandle, RoomError> {
        self.lock_rooms()
            .get(&room_id)
            .cloned()
            .ok_or(RoomError::NotFound(room_id))
    }

    /// Deletes a room on the creator's request.
    ///
    /// The actor tears itself down in order (drawer reference first,
    /// then members) before the handle is removed, so no observer ever
    /// sees a dangling drawer.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] for an unknown room,
    /// [`RoomError::Unauthorized`] when the requester is not the creator.
    pub async fn delete_room(
        &self,
        room_id: RoomId,
        requester: &Username,
    ) -> Result<(), RoomError> {
        let handle = self.handle(room_id)?;
        handle.delete(requester.clone()).await?;

        // Whoever removes the entry from the map emits the one and only
        // deletion notification.
        if self.lock_rooms().remove(&room_id).is_some() {
            let _ = self.lobby.send(ServerEvent::RoomDeleted { room_id });
            tracing::info!(%room_id, %requester, "room deleted by creator");
        }
        Ok(())
    }

    /// Removes a member from a room and cleans the room up if it emptied.
    ///
    /// This is the single convergence point for explicit leaves and
    /// transport disconnects.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] / [`RoomError::MemberNotFound`] when the
    /// room or member is already gone (both paths treat that as "nothing
    /// left to do"), [`RoomError::StoreFailed`] when the mirror rejected
    /// the removal.
    pub async fn remove_member(
        &self,
        room_id: RoomId,
        username: &Username,
    ) -> Result<LeaveOutcome, RoomError> {
        let handle = self.handle(room_id)?;
        let outcome = handle.leave(username.clone()).await?;
        if outcome.remaining == 0 {
            self.cleanup_if_empty(room_id).await;
        }
        Ok(outcome)
    }

    /// Deletes the room if it has no members, announcing the deletion
    /// registry-wide. Idempotent: an unknown or repopulated room is left
    /// alone.
    pub async fn cleanup_if_empty(&self, room_id: RoomId) {
        let Ok(handle) = self.handle(room_id) else {
            return;
        };
        let Ok(info) = handle.info().await else {
            return;
        };
        if info.member_count > 0 {
            return;
        }

        // Removing the map entry is the linearization point: exactly one
        // caller wins and emits the notification.
        if self.lock_rooms().remove(&room_id).is_none() {
            return;
        }
        let _ = handle.shutdown().await;
        let _ = self.lobby.send(ServerEvent::RoomDeleted { room_id });
        tracing::info!(%room_id, "empty room cleaned up");
    }

    /// Snapshot of all rooms for the lobby. Rooms that fail to respond
    /// (mid-shutdown) are skipped.
    pub async fn list_rooms(&self) -> Vec<RoomListEntry> {
        let handles: Vec<RoomHandle> =
            self.lock_rooms().values().cloned().collect();

        let mut entries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(info) = handle.info().await {
                entries.push(RoomListEntry {
                    room_id: info.room_id,
                    name: info.name,
                    member_count: info.member_count,
                    capacity: info.capacity,
                    visibility: info.visibility,
                });
            }
        }
        entries
    }

    /// Subscribes to registry-wide notifications (room deletions).
    pub fn subscribe_lobby(&self) -> broadcast::Receiver<ServerEvent> {
        self.lobby.subscribe()
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.lock_rooms().len()
    }

    fn lock_rooms(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<RoomId, RoomHandle>> {
        self.rooms.lock().expect("room registry lock poisoned")
    }
}
