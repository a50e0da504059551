//! Broadcast engine
//!
//! Fans messages out to registered connections. Recipient handles are copied
//! out of the registry first, so the sends run without holding its lock.
//! Delivery is best-effort and sequential; a failed recipient is skipped and
//! left for its own session to clean up.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::connection::ConnectionHandle;
use crate::frame::DEFAULT_MAX_PAYLOAD;
use crate::message::{ServerMessage, UNKNOWN_SENDER};
use crate::registry::ClientRegistry;
use crate::types::ConnectionId;

#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ClientRegistry>,
    /// Largest payload this broker will put on the wire
    max_payload: usize,
}

impl Broadcaster {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self::with_max_payload(registry, DEFAULT_MAX_PAYLOAD)
    }

    /// Broadcaster that never emits a chat payload larger than `max_payload`
    pub fn with_max_payload(registry: Arc<ClientRegistry>, max_payload: usize) -> Self {
        Self {
            registry,
            max_payload,
        }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Relay a chat line from `sender` to every other registered connection
    ///
    /// Returns the number of recipients the message was queued for. A line
    /// that no longer fits in `max_payload` once prefixed with the sender's
    /// name is dropped.
    pub async fn deliver_chat(&self, sender: ConnectionId, text: &str) -> usize {
        let from = self
            .registry
            .display_name(sender)
            .await
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

        let rendered_len = from.len() + text.len() + 3;
        if rendered_len > self.max_payload {
            warn!(
                "Dropping chat from {}: {} bytes once prefixed, max {}",
                from, rendered_len, self.max_payload
            );
            return 0;
        }

        let msg = ServerMessage::Chat {
            from,
            content: text.to_string(),
        };
        self.fan_out(msg, Some(sender)).await
    }

    /// Send a server announcement to everyone except `subject`
    pub async fn deliver_announcement(&self, subject: ConnectionId, text: &str) -> usize {
        self.fan_out(ServerMessage::announcement(text), Some(subject))
            .await
    }

    /// Push the current roster to every registered connection
    pub async fn deliver_roster(&self) -> usize {
        let names = self.registry.snapshot_names().await;
        debug!("Broadcasting roster of {} user(s)", names.len());
        self.fan_out(ServerMessage::UserList(names), None).await
    }

    async fn fan_out(&self, msg: ServerMessage, excluded: Option<ConnectionId>) -> usize {
        let recipients = self.registry.snapshot_handles_except(excluded).await;
        deliver_to(&recipients, msg).await
    }
}

/// Queue `msg` on each handle, skipping failures
async fn deliver_to(recipients: &[ConnectionHandle], msg: ServerMessage) -> usize {
    let mut delivered = 0;
    for handle in recipients {
        match handle.send(msg.clone()).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Delivery to {} failed: {}", handle.addr, e),
        }
    }
    delivered
}
