//! Room key type

use serde::{Deserialize, Serialize};

/// Unique identifier for a broadcast room
///
/// Derived from the broadcast's persistent id; renders as `live_{id}`, the
/// key scheme clients see in logs and debugging tools. A room has no
/// identity beyond its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey {
    /// Persistent id of the broadcast this room coordinates
    pub live_id: u64,
}

impl RoomKey {
    /// Create a room key for a broadcast id
    pub fn new(live_id: u64) -> Self {
        Self { live_id }
    }
}

impl std::fmt::Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "live_{}", self.live_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(RoomKey::new(42).to_string(), "live_42");
    }

    #[test]
    fn test_equality_by_live_id() {
        assert_eq!(RoomKey::new(7), RoomKey::new(7));
        assert_ne!(RoomKey::new(7), RoomKey::new(8));
    }
}
