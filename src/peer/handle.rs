//! Connection identity and outbound handle

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::protocol::ServerEvent;

/// Ephemeral identifier for a connected client
///
/// Allocated from a monotonic counter when the transport session starts and
/// never reused within a process lifetime. Carried inside signaling envelopes
/// to address relay targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a connection id from its raw value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Addressable handle for a single connection
///
/// Wraps the sender side of the connection's outbound queue. The queue is
/// drained by a single writer task, which preserves per-connection event
/// order end to end.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl PeerHandle {
    /// Create a handle for a connection
    pub fn new(id: ConnectionId, tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { id, tx }
    }

    /// The connection this handle addresses
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Enqueue an event for delivery
    ///
    /// Returns `false` if the writer task has already shut down. Losing an
    /// event to a closing connection is expected and never an error.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}
