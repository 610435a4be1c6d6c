//! Signaling server listener
//!
//! Handles the TCP accept loop, allocates connection ids, and spawns session
//! tasks. One server owns one room directory and one peer registry; all
//! coordination components are wired here.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::coordinator::{MembershipManager, SignalingRelay, StreamerCoordinator};
use crate::error::Result;
use crate::peer::{ConnectionId, PeerRegistry};
use crate::persistence::BroadcastStore;
use crate::registry::RoomDirectory;
use crate::server::config::ServerConfig;
use crate::server::session::Session;
use crate::stats::ServerStats;

/// WebSocket signaling server
pub struct SignalingServer {
    config: ServerConfig,
    peers: Arc<PeerRegistry>,
    directory: Arc<RoomDirectory>,
    membership: Arc<MembershipManager>,
    streamers: Arc<StreamerCoordinator>,
    relay: Arc<SignalingRelay>,
    stats: Arc<ServerStats>,
    next_connection_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl SignalingServer {
    /// Create a new server over the given persistence collaborator
    pub fn new(config: ServerConfig, store: Arc<dyn BroadcastStore>) -> Self {
        let peers = Arc::new(PeerRegistry::new());
        let directory = Arc::new(RoomDirectory::new());

        let streamers = Arc::new(StreamerCoordinator::new(
            Arc::clone(&directory),
            Arc::clone(&peers),
            store,
            config.persistence_timeout,
        ));
        let membership = Arc::new(MembershipManager::new(
            Arc::clone(&directory),
            Arc::clone(&peers),
            Arc::clone(&streamers),
        ));
        let relay = Arc::new(SignalingRelay::new(
            Arc::clone(&directory),
            Arc::clone(&peers),
        ));

        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            peers,
            directory,
            membership,
            streamers,
            relay,
            stats: Arc::new(ServerStats::new()),
            next_connection_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// The room directory, for inspection
    pub fn directory(&self) -> &Arc<RoomDirectory> {
        &self.directory
    }

    /// Server counters
    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling server listening");

        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit; the permit rides along with the session
        // task and frees the slot when the connection closes.
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let id = ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed));

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::debug!(connection = %id, error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let session = Session {
            id,
            peer_addr,
            peers: Arc::clone(&self.peers),
            membership: Arc::clone(&self.membership),
            streamers: Arc::clone(&self.streamers),
            relay: Arc::clone(&self.relay),
            stats: Arc::clone(&self.stats),
        };
        let stats = Arc::clone(&self.stats);

        stats.connection_opened();

        tokio::spawn(async move {
            let _permit = permit;

            if let Err(e) = session.run(socket).await {
                tracing::debug!(connection = %id, error = %e, "Connection error");
            }

            stats.connection_closed();
        });
    }
}
