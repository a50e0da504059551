//! Message protocol definitions
//!
//! Payloads are plain UTF-8 text. A few reserved prefixes and sentinels are
//! recognized by literal comparison; everything else is chat.

use crate::error::AppError;

/// Client → server: intentional close
pub const DISCONNECT_MESSAGE: &str = "!DISCONNECT";

/// Client → server: first frame after connect, carries the display name
pub const USERNAME_PREFIX: &str = "USERNAME:";

/// Server → client: roster push, followed by a JSON array of names
pub const USER_LIST_PREFIX: &str = "!USERLIST:";

/// Name shown on server-originated announcements
pub const SERVER_NAME: &str = "Server";

/// Name used when a chat sender is no longer registered
pub const UNKNOWN_SENDER: &str = "Unknown User";

/// Client → Server message received after the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Peer asked to close the session
    Disconnect,
    /// Free-text chat line
    Chat(String),
}

impl ClientMessage {
    /// Classify a decoded payload
    pub fn from_payload(payload: String) -> Self {
        if payload == DISCONNECT_MESSAGE {
            ClientMessage::Disconnect
        } else {
            ClientMessage::Chat(payload)
        }
    }
}

/// Extract the requested name from a handshake payload
///
/// Returns `None` when the payload is not a `USERNAME:` frame. The returned
/// name is trimmed and may be empty. Everything after the prefix is the name,
/// colons included (`USERNAME:a:b` is `a:b`, not `a`).
pub fn requested_username(payload: &str) -> Option<&str> {
    payload.strip_prefix(USERNAME_PREFIX).map(str::trim)
}

/// Server → Client message
///
/// Queued on each connection's outbox and rendered to a payload by its writer
/// task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Chat line or announcement, rendered as `[from] content`
    Chat { from: String, content: String },
    /// Current roster
    UserList(Vec<String>),
}

impl ServerMessage {
    /// Announcement attributed to the server itself
    pub fn announcement(content: impl Into<String>) -> Self {
        ServerMessage::Chat {
            from: SERVER_NAME.to_string(),
            content: content.into(),
        }
    }

    /// Render the wire payload
    pub fn to_payload(&self) -> Result<String, AppError> {
        match self {
            ServerMessage::Chat { from, content } => Ok(format!("[{}] {}", from, content)),
            ServerMessage::UserList(names) => Ok(format!(
                "{}{}",
                USER_LIST_PREFIX,
                serde_json::to_string(names)?
            )),
        }
    }
}

/// Inbound event as seen by a protocol consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Roster update
    Roster(Vec<String>),
    /// Displayable chat or system line
    Line(String),
}

impl ServerEvent {
    /// Classify a payload received from the server
    ///
    /// A `!USERLIST:` payload whose JSON does not parse is surfaced as a plain
    /// line rather than dropped.
    pub fn from_payload(payload: String) -> Self {
        if let Some(json) = payload.strip_prefix(USER_LIST_PREFIX) {
            if let Ok(names) = serde_json::from_str::<Vec<String>>(json) {
                return ServerEvent::Roster(names);
            }
        }
        ServerEvent::Line(payload)
    }
}
