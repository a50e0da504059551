//! Client registry
//!
//! Shared mapping from connection to peer metadata. Every operation holds the
//! lock only for the map operation itself; callers copy handles out and do
//! their I/O after the guard is released.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::debug;

use crate::connection::ConnectionHandle;
use crate::types::{ConnectionId, PeerInfo};

/// Registered connection with its peer metadata
#[derive(Debug, Clone)]
struct Entry {
    handle: ConnectionHandle,
    info: PeerInfo,
}

/// Registry of connections that completed the handshake
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ConnectionId, Entry>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a connection, replacing any entry with the same id
    pub async fn register(&self, handle: ConnectionHandle, info: PeerInfo) {
        let id = handle.id;
        let mut clients = self.clients.lock().await;
        if clients.insert(id, Entry { handle, info }).is_some() {
            debug!("Connection {} re-registered", id);
        }
    }

    /// Remove a connection
    ///
    /// Removing an absent id is a no-op, so failure paths may call this
    /// unconditionally.
    pub async fn deregister(&self, id: ConnectionId) -> Option<PeerInfo> {
        self.clients.lock().await.remove(&id).map(|entry| entry.info)
    }

    /// Display name of a registered connection
    pub async fn display_name(&self, id: ConnectionId) -> Option<String> {
        self.clients
            .lock()
            .await
            .get(&id)
            .map(|entry| entry.info.display_name.clone())
    }

    /// Display names of all registered connections
    ///
    /// Order follows map iteration and carries no meaning.
    pub async fn snapshot_names(&self) -> Vec<String> {
        self.clients
            .lock()
            .await
            .values()
            .map(|entry| entry.info.display_name.clone())
            .collect()
    }

    /// Handles of all registered connections except `excluded`
    pub async fn snapshot_handles_except(
        &self,
        excluded: Option<ConnectionId>,
    ) -> Vec<ConnectionHandle> {
        self.clients
            .lock()
            .await
            .values()
            .filter(|entry| Some(entry.handle.id) != excluded)
            .map(|entry| entry.handle.clone())
            .collect()
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.clients.lock().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }
}
