//! Persistence collaborator seam
//!
//! Durable broadcast metadata lives in an external service; this crate only
//! mirrors room-level streamer presence into it. The [`BroadcastStore`] trait
//! is the seam: the streamer coordinator calls `set_active` before committing
//! a claim or revoke, so the in-memory and durable views never diverge.
//!
//! An in-memory implementation ships in [`memory`] for tests and demos.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryBroadcastStore;

/// Durable record for a broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    /// Persistent broadcast id; also the room key's live id
    pub id: u64,
    /// Broadcast title
    pub title: String,
    /// Broadcast description
    pub description: String,
    /// Display name of the creator
    pub creator_name: String,
    /// Whether a streamer is currently live
    pub is_active: bool,
    /// When the broadcast was created
    pub created_at: DateTime<Utc>,
}

/// Error type for store operations
#[derive(Debug, Clone)]
pub enum StoreError {
    /// No broadcast with the given id
    NotFound(u64),
    /// The write did not complete within the configured timeout
    Timeout,
    /// The backing service failed
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Broadcast not found: {}", id),
            StoreError::Timeout => write!(f, "Store operation timed out"),
            StoreError::Backend(msg) => write!(f, "Store backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// External persistence service for broadcast records
///
/// Implementations must be safe to call concurrently. `set_active` is on the
/// claim/revoke critical path and should impose its own backend timeouts; the
/// coordinator additionally bounds the call with `persistence_timeout`.
#[async_trait]
pub trait BroadcastStore: Send + Sync {
    /// Fetch a broadcast by id
    async fn broadcast_by_id(&self, id: u64) -> Result<Broadcast, StoreError>;

    /// Set a broadcast's live status, returning the updated record
    async fn set_active(&self, id: u64, active: bool) -> Result<Broadcast, StoreError>;
}
