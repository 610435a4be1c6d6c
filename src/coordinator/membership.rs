//! Room membership lifecycle
//!
//! Join, leave, and disconnect all funnel through here. Every membership
//! change recomputes the viewer count from the member set and broadcasts it
//! under the room's lock, so the count every member sees reflects the state
//! at the instant it was computed.

use std::sync::Arc;

use crate::peer::{ConnectionId, PeerRegistry};
use crate::protocol::ServerEvent;
use crate::registry::{RoomDirectory, RoomKey};

use super::streamer::StreamerCoordinator;

/// Reply to a join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinAck {
    /// Viewer count after the join, joiner included
    pub viewer_count: u32,
    /// Identity of the room's streamer, when one is assigned and it is not
    /// the joiner; the joiner uses it to initiate negotiation
    pub streamer_id: Option<ConnectionId>,
}

/// Handles the join/leave/disconnect lifecycle for rooms
pub struct MembershipManager {
    directory: Arc<RoomDirectory>,
    peers: Arc<PeerRegistry>,
    streamers: Arc<StreamerCoordinator>,
}

impl MembershipManager {
    /// Create a manager over the given directory, peers, and coordinator
    pub fn new(
        directory: Arc<RoomDirectory>,
        peers: Arc<PeerRegistry>,
        streamers: Arc<StreamerCoordinator>,
    ) -> Self {
        Self {
            directory,
            peers,
            streamers,
        }
    }

    /// Add a connection to a room
    ///
    /// Creates the room if absent. Idempotent for a connection already in
    /// the room. Broadcasts the recomputed viewer count to all members and
    /// tells the joiner who the streamer is, if one is assigned.
    pub async fn join(&self, connection: ConnectionId, key: RoomKey) -> JoinAck {
        loop {
            let room_arc = self.directory.get_or_create(key).await;
            let mut room = room_arc.lock().await;

            // Lost a race with eviction; the key now maps to a fresh room
            if room.is_evicted() {
                drop(room);
                continue;
            }

            room.insert_member(connection);
            let viewer_count = room.viewer_count();

            self.peers
                .send_to_each(
                    room.members(),
                    &ServerEvent::ViewerCountUpdate {
                        count: viewer_count,
                    },
                )
                .await;

            let streamer_id = room.streamer().filter(|s| *s != connection);

            tracing::info!(
                room = %key,
                connection = %connection,
                viewers = viewer_count,
                "Connection joined room"
            );

            return JoinAck {
                viewer_count,
                streamer_id,
            };
        }
    }

    /// Remove a connection from a room
    ///
    /// No-op if the connection is not a member. Broadcasts the recomputed
    /// count to the remaining members; if the leaver held the streamer role
    /// the revoke path runs (persist inactive, `streamer-gone`), and an
    /// emptied room is evicted from the directory.
    pub async fn leave(&self, connection: ConnectionId, key: RoomKey) {
        let Some(room_arc) = self.directory.get(key).await else {
            return;
        };

        let (was_streamer, now_empty) = {
            let mut room = room_arc.lock().await;

            if !room.remove_member(connection) {
                return;
            }

            let viewer_count = room.viewer_count();
            self.peers
                .send_to_each(
                    room.members(),
                    &ServerEvent::ViewerCountUpdate {
                        count: viewer_count,
                    },
                )
                .await;

            tracing::info!(
                room = %key,
                connection = %connection,
                viewers = viewer_count,
                "Connection left room"
            );

            (room.streamer() == Some(connection), room.is_empty())
        };

        // Revoke before eviction so the inactive status is still persisted
        // for a streamer who was the last one out.
        if was_streamer {
            if let Err(e) = self.streamers.revoke(connection, key).await {
                tracing::warn!(
                    room = %key,
                    connection = %connection,
                    error = %e,
                    "Streamer revoke failed during leave"
                );
            }
        }

        if now_empty {
            self.directory.remove_if_empty(key).await;
        }
    }

    /// Tear down all memberships for a disconnecting connection
    ///
    /// A connection normally belongs to at most one room, but the scan does
    /// not assume it. Safe to call for a connection in zero rooms, and
    /// idempotent: a second call finds no memberships and produces no
    /// broadcasts.
    pub async fn disconnect(&self, connection: ConnectionId) {
        for key in self.directory.keys().await {
            self.leave(connection, key).await;
        }
    }
}
