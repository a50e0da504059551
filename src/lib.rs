//! Multi-client TCP Chat Broker Library
//!
//! A central process accepts TCP connections, binds each to a display name
//! and relays chat lines to every other connected client while keeping all
//! of them updated with the live roster.
//!
//! # Protocol
//! Every message is a 64-byte header holding the payload's byte length as
//! space-padded ASCII decimal, followed by the UTF-8 payload. Reserved
//! payloads:
//! - `USERNAME:<name>`: first frame from a client
//! - `!DISCONNECT`: client is leaving
//! - `!USERLIST:<json array>`: roster push from the server
//!
//! Everything else is chat, relayed as `[<name>] <text>` to all peers except
//! the sender.
//!
//! # Architecture
//! - `ClientRegistry` is the only shared state, behind one async mutex held
//!   just long enough to copy data in or out
//! - Each connection runs a session task (reads) and a writer task (writes)
//! - `Broadcaster` snapshots recipients and sends outside the lock
//!
//! # Example
//! ```ignore
//! use chat_broker::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chat_broker::AppError> {
//!     let server = ChatServer::bind(ServerConfig::with_addr("127.0.0.1:5050")).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use broadcast::Broadcaster;
pub use client::{connect, connect_with_max, ChatReceiver, ChatSender};
pub use config::ServerConfig;
pub use connection::ConnectionHandle;
pub use error::{AppError, DeliveryError, FrameError, HandshakeError};
pub use frame::HEADER_SIZE;
pub use handler::{handle_connection, SessionState};
pub use message::{ClientMessage, ServerEvent, ServerMessage};
pub use registry::ClientRegistry;
pub use server::ChatServer;
pub use types::{ConnectionId, PeerInfo};
