//! Streamer role coordination
//!
//! Per-room state machine with two states: no streamer, or exactly one.
//! Claims and revokes run entirely under the room's lock, including the
//! persistence write, so concurrent claims on one room serialize and the
//! in-memory assignment never disagrees with the durable record.

use std::sync::Arc;
use std::time::Duration;

use crate::peer::{ConnectionId, PeerRegistry};
use crate::persistence::{BroadcastStore, StoreError};
use crate::protocol::ServerEvent;
use crate::registry::{RoomDirectory, RoomKey, SignalError};

/// Reply to a successful claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimAck {
    /// Viewer count at the instant the role was assigned
    pub viewer_count: u32,
}

/// Assigns and revokes the streamer role for rooms
pub struct StreamerCoordinator {
    directory: Arc<RoomDirectory>,
    peers: Arc<PeerRegistry>,
    store: Arc<dyn BroadcastStore>,
    persistence_timeout: Duration,
}

impl StreamerCoordinator {
    /// Create a coordinator over the given directory, peers, and store
    pub fn new(
        directory: Arc<RoomDirectory>,
        peers: Arc<PeerRegistry>,
        store: Arc<dyn BroadcastStore>,
        persistence_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            peers,
            store,
            persistence_timeout,
        }
    }

    /// Claim the streamer role for a room
    ///
    /// Fails with `AlreadyStreaming` if any streamer is assigned, including
    /// the claimant itself: claiming twice is rejected, not idempotent, so a
    /// duplicate `start-stream` can never double-fire the room notification.
    /// The claimant must already be a member of the room.
    ///
    /// The active-status write to the persistence collaborator completes
    /// before the assignment is recorded; if the write fails or times out,
    /// the room stays streamerless and the error is returned to the caller.
    pub async fn claim(
        &self,
        connection: ConnectionId,
        key: RoomKey,
    ) -> Result<ClaimAck, SignalError> {
        let room_arc = self
            .directory
            .get(key)
            .await
            .ok_or(SignalError::RoomNotFound(key))?;
        let mut room = room_arc.lock().await;

        if room.is_evicted() {
            return Err(SignalError::RoomNotFound(key));
        }
        if !room.is_member(connection) {
            return Err(SignalError::NotInRoom(key));
        }
        if let Some(current) = room.streamer() {
            tracing::debug!(
                room = %key,
                connection = %connection,
                streamer = %current,
                "Claim rejected, room already has a streamer"
            );
            return Err(SignalError::AlreadyStreaming(key));
        }

        // Durable status first; the room lock is held across the await so
        // nothing else can observe a half-committed claim.
        self.persist_active(key, true).await?;

        room.set_streamer(connection);
        let viewer_count = room.viewer_count();

        self.peers
            .send_to_each(
                room.members(),
                &ServerEvent::StreamerAssigned {
                    streamer_id: connection,
                    viewer_count,
                },
            )
            .await;

        tracing::info!(
            room = %key,
            connection = %connection,
            viewers = viewer_count,
            "Streamer assigned"
        );

        Ok(ClaimAck { viewer_count })
    }

    /// Revoke the streamer role held by `connection`
    ///
    /// No-op unless `connection` is the room's current streamer, so a stale
    /// or duplicate revoke can never clear a newer streamer's assignment.
    /// On success the inactive status is persisted and `streamer-gone`
    /// broadcast to the room; a failed persistence write keeps the
    /// assignment in place and surfaces the error.
    pub async fn revoke(&self, connection: ConnectionId, key: RoomKey) -> Result<(), SignalError> {
        let Some(room_arc) = self.directory.get(key).await else {
            return Ok(());
        };
        let mut room = room_arc.lock().await;

        if room.streamer() != Some(connection) {
            return Ok(());
        }

        self.persist_active(key, false).await?;

        room.clear_streamer();
        self.peers
            .send_to_each(room.members(), &ServerEvent::StreamerGone)
            .await;

        tracing::info!(
            room = %key,
            connection = %connection,
            viewers = room.viewer_count(),
            "Streamer gone"
        );

        Ok(())
    }

    async fn persist_active(&self, key: RoomKey, active: bool) -> Result<(), SignalError> {
        let write = self.store.set_active(key.live_id, active);

        match tokio::time::timeout(self.persistence_timeout, write).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => {
                tracing::warn!(room = %key, active, error = %e, "Status write failed");
                Err(SignalError::Persistence(e))
            }
            Err(_) => {
                tracing::warn!(room = %key, active, "Status write timed out");
                Err(SignalError::Persistence(StoreError::Timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::PeerHandle;
    use crate::persistence::{Broadcast, MemoryBroadcastStore};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct FailingStore;

    #[async_trait]
    impl BroadcastStore for FailingStore {
        async fn broadcast_by_id(&self, id: u64) -> Result<Broadcast, StoreError> {
            Err(StoreError::NotFound(id))
        }

        async fn set_active(&self, _id: u64, _active: bool) -> Result<Broadcast, StoreError> {
            Err(StoreError::Backend("database unavailable".into()))
        }
    }

    /// Store whose deactivate writes fail until `heal` is called
    struct FlakyDeactivateStore {
        inner: MemoryBroadcastStore,
        deactivate_ok: std::sync::atomic::AtomicBool,
    }

    impl FlakyDeactivateStore {
        fn new(inner: MemoryBroadcastStore) -> Self {
            Self {
                inner,
                deactivate_ok: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn heal(&self) {
            self.deactivate_ok
                .store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl BroadcastStore for FlakyDeactivateStore {
        async fn broadcast_by_id(&self, id: u64) -> Result<Broadcast, StoreError> {
            self.inner.broadcast_by_id(id).await
        }

        async fn set_active(&self, id: u64, active: bool) -> Result<Broadcast, StoreError> {
            if !active && !self.deactivate_ok.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StoreError::Backend("database unavailable".into()));
            }
            self.inner.set_active(id, active).await
        }
    }

    struct StalledStore;

    #[async_trait]
    impl BroadcastStore for StalledStore {
        async fn broadcast_by_id(&self, id: u64) -> Result<Broadcast, StoreError> {
            Err(StoreError::NotFound(id))
        }

        async fn set_active(&self, _id: u64, _active: bool) -> Result<Broadcast, StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    async fn setup(
        store: Arc<dyn BroadcastStore>,
    ) -> (Arc<RoomDirectory>, Arc<PeerRegistry>, StreamerCoordinator) {
        let directory = Arc::new(RoomDirectory::new());
        let peers = Arc::new(PeerRegistry::new());
        let coordinator = StreamerCoordinator::new(
            Arc::clone(&directory),
            Arc::clone(&peers),
            store,
            Duration::from_millis(100),
        );
        (directory, peers, coordinator)
    }

    async fn add_member(
        directory: &RoomDirectory,
        peers: &PeerRegistry,
        key: RoomKey,
        id: u64,
    ) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = ConnectionId::new(id);
        peers.register(PeerHandle::new(connection, tx)).await;
        let room_arc = directory.get_or_create(key).await;
        room_arc.lock().await.insert_member(connection);
        rx
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_claim_assigns_and_persists() {
        let store = Arc::new(MemoryBroadcastStore::new());
        let broadcast = store.create("live", "", "alice").await;
        let key = RoomKey::new(broadcast.id);
        let (directory, peers, coordinator) = setup(store.clone()).await;

        let mut rx_a = add_member(&directory, &peers, key, 1).await;
        let mut rx_b = add_member(&directory, &peers, key, 2).await;

        let ack = coordinator.claim(ConnectionId::new(1), key).await.unwrap();
        assert_eq!(ack.viewer_count, 2);

        // Durable status mirrored
        assert!(store.broadcast_by_id(broadcast.id).await.unwrap().is_active);

        // Both members notified
        let expected = ServerEvent::StreamerAssigned {
            streamer_id: ConnectionId::new(1),
            viewer_count: 2,
        };
        assert_eq!(drain(&mut rx_a), vec![expected.clone()]);
        assert_eq!(drain(&mut rx_b), vec![expected]);
    }

    #[tokio::test]
    async fn test_second_claim_rejected() {
        let store = Arc::new(MemoryBroadcastStore::new());
        let broadcast = store.create("live", "", "alice").await;
        let key = RoomKey::new(broadcast.id);
        let (directory, peers, coordinator) = setup(store).await;

        let _rx_a = add_member(&directory, &peers, key, 1).await;
        let _rx_b = add_member(&directory, &peers, key, 2).await;

        coordinator.claim(ConnectionId::new(1), key).await.unwrap();

        let err = coordinator.claim(ConnectionId::new(2), key).await;
        assert!(matches!(err, Err(SignalError::AlreadyStreaming(_))));

        // Claiming twice from the same connection is rejected too
        let err = coordinator.claim(ConnectionId::new(1), key).await;
        assert!(matches!(err, Err(SignalError::AlreadyStreaming(_))));

        // Existing assignment untouched
        let room_arc = directory.get(key).await.unwrap();
        assert_eq!(room_arc.lock().await.streamer(), Some(ConnectionId::new(1)));
    }

    #[tokio::test]
    async fn test_claim_requires_membership() {
        let store = Arc::new(MemoryBroadcastStore::new());
        let broadcast = store.create("live", "", "alice").await;
        let key = RoomKey::new(broadcast.id);
        let (directory, peers, coordinator) = setup(store).await;

        let err = coordinator.claim(ConnectionId::new(1), key).await;
        assert!(matches!(err, Err(SignalError::RoomNotFound(_))));

        let _rx = add_member(&directory, &peers, key, 1).await;
        let err = coordinator.claim(ConnectionId::new(2), key).await;
        assert!(matches!(err, Err(SignalError::NotInRoom(_))));
    }

    #[tokio::test]
    async fn test_claim_rolls_back_on_persistence_failure() {
        let store = Arc::new(MemoryBroadcastStore::new());
        let broadcast = store.create("live", "", "alice").await;
        let key = RoomKey::new(broadcast.id);
        let (directory, peers, coordinator) = setup(Arc::new(FailingStore)).await;

        let mut rx = add_member(&directory, &peers, key, 1).await;

        let err = coordinator.claim(ConnectionId::new(1), key).await;
        assert!(matches!(err, Err(SignalError::Persistence(_))));

        // No assignment, no broadcast, durable record untouched
        let room_arc = directory.get(key).await.unwrap();
        assert!(room_arc.lock().await.streamer().is_none());
        assert!(drain(&mut rx).is_empty());
        assert!(!store.broadcast_by_id(broadcast.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_claim_times_out_on_stalled_store() {
        let key = RoomKey::new(1);
        let (directory, peers, coordinator) = setup(Arc::new(StalledStore)).await;

        let _rx = add_member(&directory, &peers, key, 1).await;

        let err = coordinator.claim(ConnectionId::new(1), key).await;
        assert!(matches!(
            err,
            Err(SignalError::Persistence(StoreError::Timeout))
        ));

        let room_arc = directory.get(key).await.unwrap();
        assert!(room_arc.lock().await.streamer().is_none());
    }

    #[tokio::test]
    async fn test_revoke_clears_and_notifies() {
        let store = Arc::new(MemoryBroadcastStore::new());
        let broadcast = store.create("live", "", "alice").await;
        let key = RoomKey::new(broadcast.id);
        let (directory, peers, coordinator) = setup(store.clone()).await;

        let mut rx_a = add_member(&directory, &peers, key, 1).await;
        let mut rx_b = add_member(&directory, &peers, key, 2).await;

        coordinator.claim(ConnectionId::new(1), key).await.unwrap();
        drain(&mut rx_a);
        drain(&mut rx_b);

        coordinator.revoke(ConnectionId::new(1), key).await.unwrap();

        assert!(!store.broadcast_by_id(broadcast.id).await.unwrap().is_active);
        assert_eq!(drain(&mut rx_a), vec![ServerEvent::StreamerGone]);
        assert_eq!(drain(&mut rx_b), vec![ServerEvent::StreamerGone]);

        let room_arc = directory.get(key).await.unwrap();
        assert!(room_arc.lock().await.streamer().is_none());
    }

    #[tokio::test]
    async fn test_revoke_keeps_assignment_on_persistence_failure() {
        let inner = MemoryBroadcastStore::new();
        let broadcast = inner.create("live", "", "alice").await;
        let key = RoomKey::new(broadcast.id);
        let store = Arc::new(FlakyDeactivateStore::new(inner));
        let (directory, peers, coordinator) = setup(store.clone()).await;

        let mut rx_a = add_member(&directory, &peers, key, 1).await;
        let mut rx_b = add_member(&directory, &peers, key, 2).await;

        coordinator.claim(ConnectionId::new(1), key).await.unwrap();
        drain(&mut rx_a);
        drain(&mut rx_b);

        let err = coordinator.revoke(ConnectionId::new(1), key).await;
        assert!(matches!(err, Err(SignalError::Persistence(_))));

        // Assignment survives, no streamer-gone, durable record still active
        let room_arc = directory.get(key).await.unwrap();
        assert_eq!(room_arc.lock().await.streamer(), Some(ConnectionId::new(1)));
        assert!(drain(&mut rx_a).is_empty());
        assert!(drain(&mut rx_b).is_empty());
        assert!(store.broadcast_by_id(broadcast.id).await.unwrap().is_active);

        // Once the store recovers, a retried revoke converges
        store.heal();
        coordinator.revoke(ConnectionId::new(1), key).await.unwrap();

        assert!(room_arc.lock().await.streamer().is_none());
        assert_eq!(drain(&mut rx_a), vec![ServerEvent::StreamerGone]);
        assert_eq!(drain(&mut rx_b), vec![ServerEvent::StreamerGone]);
        assert!(!store.broadcast_by_id(broadcast.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_stale_revoke_is_noop() {
        let store = Arc::new(MemoryBroadcastStore::new());
        let broadcast = store.create("live", "", "alice").await;
        let key = RoomKey::new(broadcast.id);
        let (directory, peers, coordinator) = setup(store.clone()).await;

        let mut rx_a = add_member(&directory, &peers, key, 1).await;
        let _rx_b = add_member(&directory, &peers, key, 2).await;

        coordinator.claim(ConnectionId::new(1), key).await.unwrap();
        drain(&mut rx_a);

        // Wrong connection: assignment and durable status must survive
        coordinator.revoke(ConnectionId::new(2), key).await.unwrap();

        let room_arc = directory.get(key).await.unwrap();
        assert_eq!(room_arc.lock().await.streamer(), Some(ConnectionId::new(1)));
        assert!(store.broadcast_by_id(broadcast.id).await.unwrap().is_active);
        assert!(drain(&mut rx_a).is_empty());

        // Revoke on a room with no streamer at all
        coordinator.revoke(ConnectionId::new(1), key).await.unwrap();
        coordinator.revoke(ConnectionId::new(1), key).await.unwrap();
        assert_eq!(drain(&mut rx_a), vec![ServerEvent::StreamerGone]);
    }

    #[tokio::test]
    async fn test_revoke_on_absent_room() {
        let (_directory, _peers, coordinator) = setup(Arc::new(MemoryBroadcastStore::new())).await;

        // Nothing to do, nothing to fail
        coordinator
            .revoke(ConnectionId::new(1), RoomKey::new(9))
            .await
            .unwrap();
    }
}
