//! Signaling and room coordination for live one-to-many broadcasts
//!
//! One streamer publishes per room, any number of viewers subscribe, and the
//! media itself flows peer to peer. This crate is the piece in the middle:
//! a WebSocket message router that tracks room membership, enforces the
//! single-streamer-per-room invariant, relays opaque WebRTC negotiation
//! payloads (offers, answers, ICE candidates) between exactly the right pair
//! of connections, fans chat out to rooms, and keeps viewer counts and
//! streamer presence converged through joins, leaves, and abrupt
//! disconnects.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use signaling_rs::{MemoryBroadcastStore, ServerConfig, SignalingServer};
//!
//! #[tokio::main]
//! async fn main() -> signaling_rs::Result<()> {
//!     let store = Arc::new(MemoryBroadcastStore::new());
//!     let server = SignalingServer::new(ServerConfig::default(), store);
//!     server.run().await
//! }
//! ```
//!
//! # Architecture
//!
//! - [`peer`]: registry of connected clients and their outbound queues
//! - [`registry`]: room directory tracking membership, streamer slot, viewer count
//! - [`coordinator`]: membership lifecycle, streamer claims, payload relay
//! - [`persistence`]: trait seam to the durable broadcast store
//! - [`protocol`]: JSON wire messages
//! - [`server`]: WebSocket accept loop and per-connection sessions
//!
//! Every room is its own mutual-exclusion domain: operations on one room
//! serialize, operations on different rooms interleave freely, and no
//! operation ever takes two room locks.

pub mod coordinator;
pub mod error;
pub mod peer;
pub mod persistence;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod stats;

pub use coordinator::{JoinAck, ClaimAck, MembershipManager, SignalingRelay, StreamerCoordinator};
pub use error::{Error, Result};
pub use peer::{ConnectionId, PeerHandle, PeerRegistry};
pub use persistence::{Broadcast, BroadcastStore, MemoryBroadcastStore, StoreError};
pub use protocol::{ClientMessage, ErrorCode, ServerEvent};
pub use registry::{Room, RoomDirectory, RoomKey, RoomStats, SignalError};
pub use server::{ServerConfig, SignalingServer};
pub use stats::{ServerStats, StatsSnapshot};
