//! Per-connection session handler
//!
//! Drives one client through its lifecycle:
//!
//! ```text
//! Connecting → Handshaking → Active → Closing → Closed
//!                   │                    ▲
//!                   └────────────────────┘  (handshake failure: nothing registered)
//! ```
//!
//! Reads happen on the session's own task and block only that task. Outbound
//! frames go through the connection's writer task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::connection::ConnectionHandle;
use crate::error::{AppError, FrameError, HandshakeError};
use crate::frame;
use crate::message::{self, ClientMessage, DISCONNECT_MESSAGE};
use crate::types::{ConnectionId, PeerInfo};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Handshaking,
    Active,
    Closing,
    Closed,
}

/// Handle a newly accepted TCP connection until it closes
pub async fn handle_connection(
    stream: TcpStream,
    broadcaster: Broadcaster,
    config: Arc<ServerConfig>,
) -> Result<(), AppError> {
    let peer_addr = stream.peer_addr()?;
    let (reader, writer) = stream.into_split();
    serve(reader, writer, peer_addr, broadcaster, config).await
}

/// Run a session over an arbitrary split byte stream
pub async fn serve<R, W>(
    reader: R,
    writer: W,
    peer_addr: SocketAddr,
    broadcaster: Broadcaster,
    config: Arc<ServerConfig>,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    Session::new(peer_addr, broadcaster, config)
        .run(reader, writer)
        .await
}

struct Session {
    id: ConnectionId,
    peer_addr: SocketAddr,
    state: SessionState,
    broadcaster: Broadcaster,
    config: Arc<ServerConfig>,
}

impl Session {
    fn new(peer_addr: SocketAddr, broadcaster: Broadcaster, config: Arc<ServerConfig>) -> Self {
        Self {
            id: ConnectionId::new(),
            peer_addr,
            state: SessionState::Connecting,
            broadcaster,
            config,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Connection {} {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }

    async fn run<R, W>(mut self, mut reader: R, writer: W) -> Result<(), AppError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!("New connection {} from {}", self.id, self.peer_addr);
        self.transition(SessionState::Handshaking);

        let peer_info = match self.handshake(&mut reader).await {
            Ok(peer_info) => peer_info,
            Err(HandshakeError::Disconnected) => {
                info!("{} disconnected before choosing a name", self.peer_addr);
                self.transition(SessionState::Closing);
                self.transition(SessionState::Closed);
                return Ok(());
            }
            Err(e) => {
                warn!("Handshake with {} failed: {}", self.peer_addr, e);
                self.transition(SessionState::Closing);
                self.transition(SessionState::Closed);
                return Err(e.into());
            }
        };

        let name = peer_info.display_name.clone();
        let (handle, writer_task) = ConnectionHandle::spawn(
            self.id,
            self.peer_addr,
            writer,
            self.config.outbox_capacity,
        );

        let registry = self.broadcaster.registry();
        registry.register(handle.clone(), peer_info).await;
        info!(
            "{} joined from {} ({} connected)",
            name,
            self.peer_addr,
            registry.len().await
        );

        self.transition(SessionState::Active);
        self.broadcaster
            .deliver_announcement(self.id, &format!("User {} joined the chat.", name))
            .await;
        self.broadcaster.deliver_roster().await;

        let result = self.receive_loop(&mut reader, &name).await;

        self.transition(SessionState::Closing);
        self.teardown(&name, handle, writer_task).await;
        self.transition(SessionState::Closed);

        result.map_err(AppError::from)
    }

    /// Read the username frame and build the peer's metadata
    async fn handshake<R>(&self, reader: &mut R) -> Result<PeerInfo, HandshakeError>
    where
        R: AsyncRead + Unpin,
    {
        let payload = frame::read_frame(reader, self.config.max_payload).await?;
        if payload == DISCONNECT_MESSAGE {
            return Err(HandshakeError::Disconnected);
        }

        let requested = message::requested_username(&payload);
        if requested.is_none() {
            debug!(
                "First frame from {} is not a username, falling back to address",
                self.peer_addr
            );
        }
        Ok(PeerInfo::new(requested, self.peer_addr))
    }

    /// Relay chat until the peer disconnects
    ///
    /// An abrupt close between frames ends the loop normally; any other read
    /// failure is returned after teardown.
    async fn receive_loop<R>(&self, reader: &mut R, name: &str) -> Result<(), FrameError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let payload = match frame::read_frame(reader, self.config.max_payload).await {
                Ok(payload) => payload,
                Err(FrameError::ConnectionClosed) => {
                    debug!("{} closed the connection", name);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Read from {} failed: {}", name, e);
                    return Err(e);
                }
            };

            match ClientMessage::from_payload(payload) {
                ClientMessage::Disconnect => {
                    debug!("{} sent disconnect", name);
                    return Ok(());
                }
                ClientMessage::Chat(text) => {
                    debug!("[{}] {}", name, text);
                    self.broadcaster.deliver_chat(self.id, &text).await;
                }
            }
        }
    }

    /// Announce departure, deregister, push the roster, close the transport
    ///
    /// None of the steps can abort the others.
    async fn teardown(
        &self,
        name: &str,
        handle: ConnectionHandle,
        mut writer_task: JoinHandle<()>,
    ) {
        self.broadcaster
            .deliver_announcement(self.id, &format!("User {} left the chat.", name))
            .await;

        let registry = self.broadcaster.registry();
        if registry.deregister(self.id).await.is_none() {
            debug!("Connection {} was already deregistered", self.id);
        }

        self.broadcaster.deliver_roster().await;

        drop(handle);
        match tokio::time::timeout(self.config.close_linger, &mut writer_task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Writer task for {} failed: {}", name, e),
            Err(_) => {
                warn!(
                    "Writer for {} did not finish within {:?}, aborting",
                    name, self.config.close_linger
                );
                writer_task.abort();
            }
        }

        info!(
            "{} disconnected from {} ({} connected)",
            name,
            self.peer_addr,
            registry.len().await
        );
    }
}
