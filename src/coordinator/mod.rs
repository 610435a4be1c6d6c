//! Room coordination components
//!
//! Three components share the room directory and peer registry:
//!
//! - [`MembershipManager`] handles the join/leave/disconnect lifecycle and
//!   keeps viewer counts converged.
//! - [`StreamerCoordinator`] enforces the single-streamer invariant and
//!   mirrors streamer presence into the persistence collaborator.
//! - [`SignalingRelay`] forwards opaque negotiation payloads between peers
//!   and fans chat comments out to rooms.

pub mod membership;
pub mod relay;
pub mod streamer;

pub use membership::{JoinAck, MembershipManager};
pub use relay::SignalingRelay;
pub use streamer::{ClaimAck, StreamerCoordinator};
