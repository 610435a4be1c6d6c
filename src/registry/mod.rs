//! Room directory for broadcast coordination
//!
//! The directory owns all per-room state: member set, streamer assignment,
//! derived viewer count. Rooms are created lazily on first join and evicted
//! when the last member leaves; nothing here survives a process restart.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<RoomDirectory>
//!                   ┌──────────────────────────┐
//!                   │ rooms: HashMap<RoomKey,  │
//!                   │   Arc<Mutex<Room {       │
//!                   │     members,             │
//!                   │     streamer,            │
//!                   │   }>>                    │
//!                   │ >                        │
//!                   └────────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            │                   │                   │
//!            ▼                   ▼                   ▼
//!    [MembershipManager] [StreamerCoordinator] [SignalingRelay]
//!    join/leave/disconnect   claim/revoke      broadcast_comment
//! ```
//!
//! # Locking discipline
//!
//! Each room has its own `tokio::sync::Mutex`, the critical section for every
//! operation that touches that room. `claim` and `revoke` hold it across the
//! persistence await, serializing the room for their duration. The outer
//! directory lock is never held while awaiting a room lock; eviction uses
//! `try_lock` and skips contended rooms, so no lock-order cycle exists.

pub mod directory;
pub mod error;
pub mod key;
pub mod room;

pub use directory::RoomDirectory;
pub use error::SignalError;
pub use key::RoomKey;
pub use room::{Room, RoomStats};
