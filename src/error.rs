//! Error types for the chat broker
//!
//! Defines framing, handshake, delivery and application-level errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::ConnectionId;

/// Wire framing errors
///
/// Any of these closes the connection that produced it. There is no retry
/// and nothing is reported back to the peer.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Peer closed the stream before a complete header arrived
    #[error("connection closed")]
    ConnectionClosed,

    /// Peer closed the stream in the middle of a payload
    #[error("connection closed mid-frame ({expected} payload bytes expected)")]
    Truncated { expected: usize },

    /// Header is not a space-padded decimal length
    #[error("invalid frame header: {0:?}")]
    InvalidHeader(String),

    /// Payload length needs more decimal digits than the header holds
    #[error("payload length {length} does not fit in a {capacity}-byte header")]
    HeaderOverflow { length: usize, capacity: usize },

    /// Declared payload length exceeds the configured maximum
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Payload bytes are not valid UTF-8
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// IO error on the underlying stream
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handshake errors
///
/// The connection is closed before registration and nothing is broadcast.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The username frame could not be read
    #[error("failed to read username frame: {0}")]
    Frame(#[from] FrameError),

    /// Peer sent the disconnect sentinel instead of a username
    #[error("peer disconnected during handshake")]
    Disconnected,
}

/// Per-recipient delivery errors
///
/// Isolated to one recipient during a broadcast; never aborts the fan-out.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient's outbox is closed (its writer task has exited)
    #[error("outbox closed for connection {0}")]
    ChannelClosed(ConnectionId),
}

/// Application-level errors
///
/// Returned by connection handlers and binaries. A handler error is logged
/// by the listener and never affects other connections.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (bind, accept, peer address lookup)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error on a client stream
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// Handshake did not complete
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
