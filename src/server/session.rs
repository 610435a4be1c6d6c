//! Per-connection session
//!
//! Each accepted socket gets one session: a writer task draining the
//! connection's outbound queue into the WebSocket sink, and a read loop
//! dispatching inbound frames onto the coordination components. Teardown
//! unregisters the peer first, so in-flight relays aimed at the dying
//! connection become silent drops, then runs the membership disconnect.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::coordinator::{MembershipManager, SignalingRelay, StreamerCoordinator};
use crate::error::Result;
use crate::peer::{ConnectionId, PeerHandle, PeerRegistry};
use crate::protocol::{ClientMessage, ErrorCode, ServerEvent};
use crate::registry::RoomKey;
use crate::stats::ServerStats;

/// One client connection from accept to teardown
pub(crate) struct Session {
    pub(crate) id: ConnectionId,
    pub(crate) peer_addr: SocketAddr,
    pub(crate) peers: Arc<PeerRegistry>,
    pub(crate) membership: Arc<MembershipManager>,
    pub(crate) streamers: Arc<StreamerCoordinator>,
    pub(crate) relay: Arc<SignalingRelay>,
    pub(crate) stats: Arc<ServerStats>,
}

impl Session {
    /// Drive the connection until the client disconnects
    pub(crate) async fn run(self, socket: TcpStream) -> Result<()> {
        let ws = tokio_tungstenite::accept_async(socket).await?;
        let (mut sink, mut stream) = ws.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

        // Single writer task per connection keeps outbound events in order.
        let writer_id = self.id;
        let writer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(connection = %writer_id, error = %e, "Event serialization failed");
                        continue;
                    }
                };

                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let handle = PeerHandle::new(self.id, tx);
        self.peers.register(handle.clone()).await;
        handle.send(ServerEvent::Welcome {
            connection_id: self.id,
        });

        tracing::debug!(connection = %self.id, peer = %self.peer_addr, "Session started");

        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => self.dispatch(&handle, &text).await,
                Ok(Message::Binary(_)) => {
                    handle.send(ServerEvent::Error {
                        code: ErrorCode::MalformedMessage,
                        message: "Binary frames are not supported".into(),
                    });
                }
                Ok(Message::Close(_)) => break,
                // Ping/pong handled by tungstenite itself
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(connection = %self.id, error = %e, "Read error");
                    break;
                }
            }
        }

        // Unregister before the room teardown: broadcasts triggered by the
        // disconnect must not target this connection anymore.
        self.peers.unregister(self.id).await;
        self.membership.disconnect(self.id).await;

        drop(handle);
        let _ = writer.await;

        tracing::debug!(connection = %self.id, "Session closed");
        Ok(())
    }

    async fn dispatch(&self, handle: &PeerHandle, text: &str) {
        let message: ClientMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(connection = %self.id, error = %e, "Malformed message");
                handle.send(ServerEvent::Error {
                    code: ErrorCode::MalformedMessage,
                    message: e.to_string(),
                });
                return;
            }
        };

        self.stats.message_routed();

        match message {
            ClientMessage::JoinRoom { live_id } => {
                let ack = self.membership.join(self.id, RoomKey::new(live_id)).await;
                handle.send(ServerEvent::JoinedRoom {
                    viewer_count: ack.viewer_count,
                    streamer_id: ack.streamer_id,
                });
            }
            ClientMessage::LeaveRoom { live_id } => {
                self.membership.leave(self.id, RoomKey::new(live_id)).await;
            }
            ClientMessage::StartStream { live_id } => {
                match self.streamers.claim(self.id, RoomKey::new(live_id)).await {
                    Ok(ack) => {
                        handle.send(ServerEvent::StreamStarted {
                            viewer_count: ack.viewer_count,
                        });
                    }
                    Err(e) => {
                        handle.send(ServerEvent::Error {
                            code: e.code(),
                            message: e.to_string(),
                        });
                    }
                }
            }
            ClientMessage::Offer { target_id, sdp, .. } => {
                self.relay.relay_offer(self.id, target_id, sdp).await;
            }
            ClientMessage::Answer { target_id, sdp } => {
                self.relay.relay_answer(self.id, target_id, sdp).await;
            }
            ClientMessage::IceCandidate {
                target_id,
                candidate,
            } => {
                self.relay.relay_candidate(self.id, target_id, candidate).await;
            }
            ClientMessage::NewComment { live_id, comment } => {
                self.relay
                    .broadcast_comment(RoomKey::new(live_id), self.id, comment)
                    .await;
                self.stats.comment_broadcast();
            }
        }
    }
}
