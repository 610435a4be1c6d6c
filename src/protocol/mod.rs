//! Wire protocol types
//!
//! JSON messages exchanged over the WebSocket connection. Inbound frames
//! deserialize into [`ClientMessage`], outbound events serialize from
//! [`ServerEvent`]. Negotiation payloads (SDP blobs, ICE candidates) are
//! opaque `serde_json::Value`s that the server never inspects.

pub mod message;

pub use message::{ClientMessage, ErrorCode, ServerEvent};
