//! Connection registry
//!
//! Maps ephemeral connection ids to their outbound message queues. The id is
//! allocated at accept time and dies with the transport session; every other
//! component addresses connections only through this registry, never by
//! holding a socket directly.

pub mod handle;
pub mod registry;

pub use handle::{ConnectionId, PeerHandle};
pub use registry::PeerRegistry;
