//! In-memory broadcast store
//!
//! Backs tests and demos. Real deployments implement [`BroadcastStore`] over
//! their own storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Broadcast, BroadcastStore, StoreError};

/// Broadcast store held entirely in process memory
pub struct MemoryBroadcastStore {
    broadcasts: RwLock<HashMap<u64, Broadcast>>,
    next_id: AtomicU64,
}

impl MemoryBroadcastStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            broadcasts: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a broadcast record
    ///
    /// New broadcasts start inactive; `set_active` flips the flag when a
    /// streamer claims the room.
    pub async fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        creator_name: impl Into<String>,
    ) -> Broadcast {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let broadcast = Broadcast {
            id,
            title: title.into(),
            description: description.into(),
            creator_name: creator_name.into(),
            is_active: false,
            created_at: Utc::now(),
        };

        self.broadcasts
            .write()
            .await
            .insert(id, broadcast.clone());

        broadcast
    }

    /// All broadcasts currently marked active, newest first
    pub async fn list_active(&self) -> Vec<Broadcast> {
        let broadcasts = self.broadcasts.read().await;
        let mut active: Vec<Broadcast> = broadcasts
            .values()
            .filter(|b| b.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        active
    }
}

impl Default for MemoryBroadcastStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BroadcastStore for MemoryBroadcastStore {
    async fn broadcast_by_id(&self, id: u64) -> Result<Broadcast, StoreError> {
        self.broadcasts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn set_active(&self, id: u64, active: bool) -> Result<Broadcast, StoreError> {
        let mut broadcasts = self.broadcasts.write().await;
        let broadcast = broadcasts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        broadcast.is_active = active;
        Ok(broadcast.clone())
    }
}
