//! Basic type definitions for the chat broker
//!
//! Provides newtype wrappers for type safety:
//! - `ConnectionId`: UUID-based unique connection identifier
//! - `PeerInfo`: display name and address bound at handshake

use std::net::SocketAddr;

use uuid::Uuid;

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe connection identification.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Peer metadata fixed at handshake completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    /// Name shown to other clients
    pub display_name: String,
    /// Remote socket address
    pub addr: SocketAddr,
}

impl PeerInfo {
    /// Build peer info from an optional requested name
    ///
    /// Falls back to the stringified peer address when the requested name
    /// is missing or blank.
    pub fn new(requested: Option<&str>, addr: SocketAddr) -> Self {
        let display_name = requested
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| addr.to_string());
        Self { display_name, addr }
    }
}
