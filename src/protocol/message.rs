//! Client and server message definitions
//!
//! Messages are tag-discriminated JSON objects: the `type` field selects the
//! variant (kebab-case), payload fields are camelCase. Example:
//!
//! ```json
//! { "type": "join-room", "liveId": 7 }
//! { "type": "offer", "liveId": 7, "targetId": 3, "sdp": { ... } }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::peer::ConnectionId;

/// Message received from a connected client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join a broadcast room as a viewer
    #[serde(rename_all = "camelCase")]
    JoinRoom { live_id: u64 },

    /// Leave a broadcast room
    #[serde(rename_all = "camelCase")]
    LeaveRoom { live_id: u64 },

    /// Claim the streamer role for a room
    #[serde(rename_all = "camelCase")]
    StartStream { live_id: u64 },

    /// Forward an SDP offer to another connection
    ///
    /// The target is addressed by connection id, never inferred from room
    /// membership. `live_id` is carried for client-side bookkeeping only.
    #[serde(rename_all = "camelCase")]
    Offer {
        live_id: u64,
        target_id: ConnectionId,
        sdp: Value,
    },

    /// Forward an SDP answer to another connection
    #[serde(rename_all = "camelCase")]
    Answer { target_id: ConnectionId, sdp: Value },

    /// Forward an ICE candidate to another connection
    #[serde(rename_all = "camelCase")]
    IceCandidate {
        target_id: ConnectionId,
        candidate: Value,
    },

    /// Post a chat comment to a room
    #[serde(rename_all = "camelCase")]
    NewComment { live_id: u64, comment: Value },
}

/// Event sent to a connected client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// First event on every connection, carries the id other peers use to
    /// address this connection
    #[serde(rename_all = "camelCase")]
    Welcome { connection_id: ConnectionId },

    /// Reply to `join-room`; `streamer_id` is present when the room already
    /// has a streamer the joiner should negotiate with
    #[serde(rename_all = "camelCase")]
    JoinedRoom {
        viewer_count: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        streamer_id: Option<ConnectionId>,
    },

    /// Room-wide viewer count update
    #[serde(rename_all = "camelCase")]
    ViewerCountUpdate { count: u32 },

    /// Room-wide notification that a streamer was assigned
    #[serde(rename_all = "camelCase")]
    StreamerAssigned {
        streamer_id: ConnectionId,
        viewer_count: u32,
    },

    /// Reply to a successful `start-stream`
    #[serde(rename_all = "camelCase")]
    StreamStarted { viewer_count: u32 },

    /// Room-wide notification that the streamer left or disconnected
    StreamerGone,

    /// Relayed SDP offer, tagged with the sender's connection id
    #[serde(rename_all = "camelCase")]
    Offer { sender_id: ConnectionId, sdp: Value },

    /// Relayed SDP answer
    #[serde(rename_all = "camelCase")]
    Answer { sender_id: ConnectionId, sdp: Value },

    /// Relayed ICE candidate
    #[serde(rename_all = "camelCase")]
    IceCandidate {
        sender_id: ConnectionId,
        candidate: Value,
    },

    /// Chat comment fanned out to the room, stamped with the server clock
    #[serde(rename_all = "camelCase")]
    CommentAdded {
        comment: Value,
        sender_id: ConnectionId,
        timestamp: DateTime<Utc>,
    },

    /// Connection-local error reply
    #[serde(rename_all = "camelCase")]
    Error { code: ErrorCode, message: String },
}

/// Machine-readable error codes for [`ServerEvent::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// The room already has an active streamer
    AlreadyStreaming,
    /// The room does not exist
    RoomNotFound,
    /// The operation requires room membership
    NotInRoom,
    /// The persistence collaborator rejected or timed out the write
    PersistenceFailure,
    /// The message could not be parsed
    MalformedMessage,
}
