//! Room directory implementation
//!
//! The single shared map from room key to room state. Access goes through
//! the membership manager, streamer coordinator, and relay; no component
//! outside this crate ever holds a direct reference into the map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::key::RoomKey;
use super::room::{Room, RoomStats};

/// Directory of live broadcast rooms
pub struct RoomDirectory {
    /// Map of room key to room state
    rooms: RwLock<HashMap<RoomKey, Arc<Mutex<Room>>>>,
}

impl RoomDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Get a room's handle, creating an empty room if absent
    ///
    /// Creation is atomic under the directory write lock. The caller must
    /// check [`Room::is_evicted`] after locking the room: the handle may have
    /// been obtained just before a concurrent eviction, in which case the
    /// caller retries and gets a fresh room.
    pub async fn get_or_create(&self, key: RoomKey) -> Arc<Mutex<Room>> {
        let mut rooms = self.rooms.write().await;

        if let Some(existing) = rooms.get(&key) {
            return Arc::clone(existing);
        }

        let room = Arc::new(Mutex::new(Room::new()));
        rooms.insert(key, Arc::clone(&room));
        tracing::debug!(room = %key, "Room created");

        room
    }

    /// Get a room's handle if the room exists
    pub async fn get(&self, key: RoomKey) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().await.get(&key).cloned()
    }

    /// Evict the room if it has no members and no streamer
    ///
    /// Runs under the directory write lock and a `try_lock` of the room, so
    /// a concurrent join cannot resurrect the key with stale state: either
    /// the join holds the room lock (try_lock fails, eviction skipped) or the
    /// eviction wins and marks the room so the join re-creates it. A skipped
    /// eviction converges on the next `leave`.
    ///
    /// Returns `true` if the room was removed.
    pub async fn remove_if_empty(&self, key: RoomKey) -> bool {
        let mut rooms = self.rooms.write().await;

        let should_remove = match rooms.get(&key) {
            Some(room_arc) => match room_arc.try_lock() {
                Ok(mut room) if room.is_empty() && room.streamer().is_none() => {
                    room.mark_evicted();
                    true
                }
                _ => false,
            },
            None => false,
        };

        if should_remove {
            rooms.remove(&key);
            tracing::debug!(room = %key, "Room evicted");
        }

        should_remove
    }

    /// Keys of all current rooms
    ///
    /// Used by the disconnect scan; the snapshot may be stale by the time a
    /// room is visited, which the per-room membership check absorbs.
    pub async fn keys(&self) -> Vec<RoomKey> {
        self.rooms.read().await.keys().copied().collect()
    }

    /// Number of rooms in the directory
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Whether the directory has no rooms
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Snapshot a room's observable state
    pub async fn stats(&self, key: RoomKey) -> Option<RoomStats> {
        let room_arc = self.get(key).await?;
        let room = room_arc.lock().await;
        Some(room.stats())
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}
