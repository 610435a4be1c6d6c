//! WebSocket signaling server
//!
//! Accept loop, per-connection sessions, and configuration. The server wires
//! the peer registry, room directory, and coordinators together and maps
//! wire messages onto them.

pub mod config;
pub mod listener;
pub mod session;

pub use config::ServerConfig;
pub use listener::SignalingServer;
