//! Per-room state
//!
//! A [`Room`] tracks who is in a broadcast and which connection currently
//! holds the streamer role. The viewer count is always derived from the
//! member set, never stored, so it cannot drift.

use std::collections::HashSet;

use crate::peer::ConnectionId;

/// State for a single broadcast room
///
/// Invariants, enforced by the coordinator methods that mutate this type:
/// at most one streamer at any instant, and a set streamer is always a
/// member of the room (a streamer counts as a viewer of its own broadcast).
pub struct Room {
    /// Connections currently in the room
    members: HashSet<ConnectionId>,

    /// Connection holding the streamer role, if any
    streamer: Option<ConnectionId>,

    /// Set when the directory drops this room; a handle obtained before the
    /// eviction must detect this and re-create instead of mutating a ghost
    evicted: bool,
}

impl Room {
    pub(super) fn new() -> Self {
        Self {
            members: HashSet::new(),
            streamer: None,
            evicted: false,
        }
    }

    /// Number of connections in the room; a streamer counts as a viewer
    pub fn viewer_count(&self) -> u32 {
        self.members.len() as u32
    }

    /// Whether the connection is a member of this room
    pub fn is_member(&self, id: ConnectionId) -> bool {
        self.members.contains(&id)
    }

    /// Member set, for broadcast fan-out under the room lock
    pub fn members(&self) -> &HashSet<ConnectionId> {
        &self.members
    }

    /// Whether the room has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The current streamer, if one is assigned
    pub fn streamer(&self) -> Option<ConnectionId> {
        self.streamer
    }

    /// Whether this room was evicted from the directory
    pub fn is_evicted(&self) -> bool {
        self.evicted
    }

    /// Add a member; returns `false` if already present
    pub(crate) fn insert_member(&mut self, id: ConnectionId) -> bool {
        self.members.insert(id)
    }

    /// Remove a member; returns `false` if not present
    pub(crate) fn remove_member(&mut self, id: ConnectionId) -> bool {
        self.members.remove(&id)
    }

    /// Assign the streamer role
    pub(crate) fn set_streamer(&mut self, id: ConnectionId) {
        debug_assert!(self.streamer.is_none());
        debug_assert!(self.members.contains(&id));
        self.streamer = Some(id);
    }

    /// Clear the streamer role
    pub(crate) fn clear_streamer(&mut self) {
        self.streamer = None;
    }

    pub(super) fn mark_evicted(&mut self) {
        self.evicted = true;
    }

    /// Snapshot of the room's observable state
    pub fn stats(&self) -> RoomStats {
        RoomStats {
            viewer_count: self.viewer_count(),
            has_streamer: self.streamer.is_some(),
        }
    }
}

/// Observable statistics for a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomStats {
    /// Number of members, streamer included
    pub viewer_count: u32,
    /// Whether a streamer is currently assigned
    pub has_streamer: bool,
}
