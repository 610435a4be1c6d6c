//! Server-wide counters
//!
//! Shared across connection tasks, so everything is atomic. Reads are
//! snapshot-style and only loosely consistent with each other, which is fine
//! for logging and dashboards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Live counters for a running signaling server
#[derive(Debug)]
pub struct ServerStats {
    total_connections: AtomicU64,
    active_connections: AtomicU64,
    messages_routed: AtomicU64,
    comments_broadcast: AtomicU64,
    started_at: Instant,
}

impl ServerStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            messages_routed: AtomicU64::new(0),
            comments_broadcast: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Record an accepted connection
    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection
    pub fn connection_closed(&self) {
        // fetch_update so a spurious double-close cannot wrap below zero
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Record a dispatched client message
    pub fn message_routed(&self) {
        self.messages_routed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a comment fan-out
    pub fn comment_broadcast(&self) {
        self.comments_broadcast.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            messages_routed: self.messages_routed.load(Ordering::Relaxed),
            comments_broadcast: self.comments_broadcast.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of [`ServerStats`]
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    /// Total connections ever accepted
    pub total_connections: u64,
    /// Currently open connections
    pub active_connections: u64,
    /// Client messages dispatched
    pub messages_routed: u64,
    /// Chat comments fanned out
    pub comments_broadcast: u64,
    /// Time since the stats were created
    pub uptime: std::time::Duration,
}
