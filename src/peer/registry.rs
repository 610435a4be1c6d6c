//! Peer registry implementation
//!
//! Thread-safe map of connection id to [`PeerHandle`]. Read-heavy: relays and
//! room broadcasts resolve handles far more often than connections come and
//! go, so the map sits behind an `RwLock`.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::handle::{ConnectionId, PeerHandle};
use crate::protocol::ServerEvent;

/// Registry of currently connected peers
pub struct PeerRegistry {
    peers: RwLock<HashMap<ConnectionId, PeerHandle>>,
}

impl PeerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection's handle
    pub async fn register(&self, handle: PeerHandle) {
        let id = handle.id();
        let previous = self.peers.write().await.insert(id, handle);

        if previous.is_some() {
            // Ids are never reused, so a collision means a lifecycle bug upstream
            tracing::warn!(connection = %id, "Peer registered twice, replacing handle");
        } else {
            tracing::debug!(connection = %id, "Peer registered");
        }
    }

    /// Remove a connection's handle
    ///
    /// Idempotent; returns `true` if the peer was still registered.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.peers.write().await.remove(&id).is_some();
        if removed {
            tracing::debug!(connection = %id, "Peer unregistered");
        }
        removed
    }

    /// Look up a connection's handle
    pub async fn get(&self, id: ConnectionId) -> Option<PeerHandle> {
        self.peers.read().await.get(&id).cloned()
    }

    /// Check whether a connection is currently registered
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.peers.read().await.contains_key(&id)
    }

    /// Number of registered peers
    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Whether no peers are registered
    pub async fn is_empty(&self) -> bool {
        self.peers.read().await.is_empty()
    }

    /// Deliver an event to a single connection
    ///
    /// Returns `false` if the target is not registered or its writer task has
    /// shut down.
    pub async fn send_to(&self, id: ConnectionId, event: ServerEvent) -> bool {
        match self.peers.read().await.get(&id) {
            Some(handle) => handle.send(event),
            None => false,
        }
    }

    /// Deliver an event to each of the given connections
    ///
    /// Resolves all handles under one read lock. Unregistered or closed
    /// targets are skipped; returns the number of deliveries enqueued.
    pub async fn send_to_each<'a, I>(&self, ids: I, event: &ServerEvent) -> usize
    where
        I: IntoIterator<Item = &'a ConnectionId>,
    {
        let peers = self.peers.read().await;
        let mut delivered = 0;

        for id in ids {
            if let Some(handle) = peers.get(id) {
                if handle.send(event.clone()) {
                    delivered += 1;
                }
            }
        }

        delivered
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn peer(id: u64) -> (PeerHandle, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PeerHandle::new(ConnectionId::new(id), tx), rx)
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = PeerRegistry::new();
        let (handle, _rx) = peer(1);

        registry.register(handle).await;

        assert!(registry.contains(ConnectionId::new(1)).await);
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(ConnectionId::new(1)).await.is_some());
        assert!(registry.get(ConnectionId::new(2)).await.is_none());
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = PeerRegistry::new();
        let (handle, _rx) = peer(1);
        registry.register(handle).await;

        assert!(registry.unregister(ConnectionId::new(1)).await);
        assert!(!registry.unregister(ConnectionId::new(1)).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_send_to_unknown_target() {
        let registry = PeerRegistry::new();

        let delivered = registry
            .send_to(ConnectionId::new(9), ServerEvent::StreamerGone)
            .await;

        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_send_to_each_skips_missing_peers() {
        let registry = PeerRegistry::new();
        let (a, mut rx_a) = peer(1);
        let (b, mut rx_b) = peer(2);
        registry.register(a).await;
        registry.register(b).await;

        let ids = [
            ConnectionId::new(1),
            ConnectionId::new(2),
            ConnectionId::new(3),
        ];
        let delivered = registry
            .send_to_each(ids.iter(), &ServerEvent::ViewerCountUpdate { count: 2 })
            .await;

        assert_eq!(delivered, 2);
        assert_eq!(
            rx_a.try_recv().unwrap(),
            ServerEvent::ViewerCountUpdate { count: 2 }
        );
        assert_eq!(
            rx_b.try_recv().unwrap(),
            ServerEvent::ViewerCountUpdate { count: 2 }
        );
    }
}
