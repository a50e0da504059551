//! Connection handle
//!
//! Represents one live transport connection: its identity, peer address and
//! the outbox feeding the socket's write half.

use std::net::SocketAddr;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{DeliveryError, FrameError};
use crate::frame;
use crate::message::ServerMessage;
use crate::types::ConnectionId;

/// Handle to a connected peer
///
/// Cheap to clone; every clone feeds the same writer task. The writer exits
/// once all clones are dropped or the socket stops accepting writes.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Remote socket address
    pub addr: SocketAddr,
    /// Server → Client message channel
    sender: mpsc::Sender<ServerMessage>,
}

impl ConnectionHandle {
    /// Create a handle around an existing outbox sender
    pub fn new(id: ConnectionId, addr: SocketAddr, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, addr, sender }
    }

    /// Create a handle and spawn the writer task that drains it into `writer`
    ///
    /// A `capacity` of zero is treated as one.
    pub fn spawn<W>(
        id: ConnectionId,
        addr: SocketAddr,
        writer: W,
        capacity: usize,
    ) -> (Self, JoinHandle<()>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(write_loop(id, writer, rx));
        (Self::new(id, addr, tx), task)
    }

    /// Queue a message for this peer
    ///
    /// Returns an error if the writer task has exited (peer gone).
    pub async fn send(&self, msg: ServerMessage) -> Result<(), DeliveryError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| DeliveryError::ChannelClosed(self.id))
    }

    /// Check whether the writer task is still accepting messages
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Drain the outbox into the socket, one frame per message
async fn write_loop<W>(id: ConnectionId, mut writer: W, mut rx: mpsc::Receiver<ServerMessage>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = rx.recv().await {
        let payload = match msg.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to render message for {}: {}", id, e);
                // Continue - don't break on serialization errors
                continue;
            }
        };

        match frame::write_frame(&mut writer, &payload).await {
            Ok(()) => {}
            Err(e @ FrameError::HeaderOverflow { .. }) => {
                error!("Dropping unframeable message for {}: {}", id, e);
            }
            Err(e) => {
                debug!("Write to {} failed, ending writer task: {}", id, e);
                break;
            }
        }
    }

    let _ = writer.shutdown().await;
    debug!("Writer task ended for {}", id);
}
