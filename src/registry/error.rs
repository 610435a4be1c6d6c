//! Signaling error types
//!
//! Errors for room coordination operations. None of these are fatal; each is
//! reported to the connection that triggered it and the room converges.

use super::key::RoomKey;
use crate::persistence::StoreError;
use crate::protocol::ErrorCode;

/// Error type for room coordination operations
#[derive(Debug, Clone)]
pub enum SignalError {
    /// Room does not exist
    RoomNotFound(RoomKey),
    /// The operation requires the connection to be a room member
    NotInRoom(RoomKey),
    /// Room already has an active streamer
    AlreadyStreaming(RoomKey),
    /// The persistence collaborator rejected or timed out a status write;
    /// the in-memory assignment was rolled back
    Persistence(StoreError),
}

impl SignalError {
    /// Wire-level error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            SignalError::RoomNotFound(_) => ErrorCode::RoomNotFound,
            SignalError::NotInRoom(_) => ErrorCode::NotInRoom,
            SignalError::AlreadyStreaming(_) => ErrorCode::AlreadyStreaming,
            SignalError::Persistence(_) => ErrorCode::PersistenceFailure,
        }
    }
}

impl std::fmt::Display for SignalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalError::RoomNotFound(key) => write!(f, "Room not found: {}", key),
            SignalError::NotInRoom(key) => write!(f, "Not a member of room: {}", key),
            SignalError::AlreadyStreaming(key) => {
                write!(f, "Room already has a streamer: {}", key)
            }
            SignalError::Persistence(e) => write!(f, "Persistence write failed: {}", e),
        }
    }
}

impl std::error::Error for SignalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SignalError::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for SignalError {
    fn from(e: StoreError) -> Self {
        SignalError::Persistence(e)
    }
}
