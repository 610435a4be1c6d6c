//! Signaling relay
//!
//! Stateless per message. Negotiation payloads travel from a sender to a
//! named target connection; chat comments fan out to a whole room. Payload
//! contents are opaque blobs, forwarded untouched and never parsed.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::peer::{ConnectionId, PeerRegistry};
use crate::protocol::ServerEvent;
use crate::registry::{RoomDirectory, RoomKey};

/// Forwards negotiation payloads and chat between connections
pub struct SignalingRelay {
    directory: Arc<RoomDirectory>,
    peers: Arc<PeerRegistry>,
}

impl SignalingRelay {
    /// Create a relay over the given directory and peers
    pub fn new(directory: Arc<RoomDirectory>, peers: Arc<PeerRegistry>) -> Self {
        Self { directory, peers }
    }

    /// Deliver an SDP offer to the target connection, tagged with the sender
    pub async fn relay_offer(&self, from: ConnectionId, to: ConnectionId, sdp: Value) {
        self.relay(to, ServerEvent::Offer { sender_id: from, sdp }, "offer")
            .await;
    }

    /// Deliver an SDP answer to the target connection, tagged with the sender
    pub async fn relay_answer(&self, from: ConnectionId, to: ConnectionId, sdp: Value) {
        self.relay(to, ServerEvent::Answer { sender_id: from, sdp }, "answer")
            .await;
    }

    /// Deliver an ICE candidate to the target connection, tagged with the sender
    pub async fn relay_candidate(&self, from: ConnectionId, to: ConnectionId, candidate: Value) {
        self.relay(
            to,
            ServerEvent::IceCandidate {
                sender_id: from,
                candidate,
            },
            "ice-candidate",
        )
        .await;
    }

    /// Fan a chat comment out to every member of a room, sender included
    ///
    /// The comment is stamped with the sender id and the server clock. An
    /// unknown room is a silent drop, same as an unknown relay target.
    pub async fn broadcast_comment(&self, key: RoomKey, from: ConnectionId, comment: Value) {
        let Some(room_arc) = self.directory.get(key).await else {
            tracing::debug!(room = %key, sender = %from, "Comment for unknown room, dropping");
            return;
        };

        let event = ServerEvent::CommentAdded {
            comment,
            sender_id: from,
            timestamp: Utc::now(),
        };

        let room = room_arc.lock().await;
        let delivered = self.peers.send_to_each(room.members(), &event).await;

        tracing::debug!(
            room = %key,
            sender = %from,
            delivered,
            "Comment broadcast"
        );
    }

    /// Deliver an event to a single target connection
    ///
    /// The target may have disconnected between message send and delivery;
    /// that is an expected race, so the message is dropped and logged, never
    /// surfaced to the sender.
    async fn relay(&self, to: ConnectionId, event: ServerEvent, kind: &str) {
        if !self.peers.send_to(to, event).await {
            tracing::debug!(target = %to, kind, "Relay target not connected, dropping");
        }
    }
}
