//! Server configuration

use std::time::Duration;

use crate::frame::DEFAULT_MAX_PAYLOAD;

/// Default listen address
pub const DEFAULT_ADDR: &str = "0.0.0.0:5050";

/// Default per-connection outbox capacity
pub const DEFAULT_OUTBOX_CAPACITY: usize = 32;

/// Default time a closing session waits for its writer to flush
pub const DEFAULT_CLOSE_LINGER: Duration = Duration::from_secs(2);

/// Runtime settings shared by the listener and every session
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind_addr: String,
    /// Largest payload a client may declare in a frame header
    pub max_payload: usize,
    /// Messages buffered per connection before senders wait (zero acts as one)
    pub outbox_capacity: usize,
    /// Upper bound on flushing queued messages during teardown
    pub close_linger: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            max_payload: DEFAULT_MAX_PAYLOAD,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            close_linger: DEFAULT_CLOSE_LINGER,
        }
    }
}

impl ServerConfig {
    /// Default settings listening on `bind_addr`
    pub fn with_addr(bind_addr: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            ..Self::default()
        }
    }
}
