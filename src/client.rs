//! Protocol-consumer client
//!
//! Thin wrapper over the frame codec for programs that talk to the broker:
//! sends the username handshake, chat lines and the disconnect sentinel, and
//! classifies inbound payloads into roster updates and display lines.

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::FrameError;
use crate::frame::{self, DEFAULT_MAX_PAYLOAD};
use crate::message::{ServerEvent, DISCONNECT_MESSAGE, USERNAME_PREFIX};

/// Connect to a broker and complete the username handshake
///
/// Accepts inbound payloads up to `DEFAULT_MAX_PAYLOAD`, the broker's default
/// outbound limit.
pub async fn connect<A: ToSocketAddrs>(
    addr: A,
    username: &str,
) -> Result<(ChatSender, ChatReceiver), FrameError> {
    connect_with_max(addr, username, DEFAULT_MAX_PAYLOAD).await
}

/// Like `connect`, for brokers configured with a different `max_payload`
pub async fn connect_with_max<A: ToSocketAddrs>(
    addr: A,
    username: &str,
    max_payload: usize,
) -> Result<(ChatSender, ChatReceiver), FrameError> {
    let stream = TcpStream::connect(addr).await?;
    let (reader, writer) = stream.into_split();

    let mut sender = ChatSender { writer };
    sender
        .send_raw(&format!("{}{}", USERNAME_PREFIX, username))
        .await?;

    let receiver = ChatReceiver {
        reader,
        max_payload,
    };
    Ok((sender, receiver))
}

/// Outbound half of a client connection
#[derive(Debug)]
pub struct ChatSender {
    writer: OwnedWriteHalf,
}

impl ChatSender {
    /// Send one chat line
    pub async fn send_chat(&mut self, text: &str) -> Result<(), FrameError> {
        self.send_raw(text).await
    }

    /// Send an arbitrary payload
    pub async fn send_raw(&mut self, payload: &str) -> Result<(), FrameError> {
        frame::write_frame(&mut self.writer, payload).await
    }

    /// Send the disconnect sentinel and close the write side
    pub async fn disconnect(mut self) -> Result<(), FrameError> {
        self.send_raw(DISCONNECT_MESSAGE).await
    }
}

/// Inbound half of a client connection
#[derive(Debug)]
pub struct ChatReceiver {
    reader: OwnedReadHalf,
    max_payload: usize,
}

impl ChatReceiver {
    /// Wait for the next server payload
    ///
    /// Not cancel-safe: a partially read frame is lost if the future is
    /// dropped. Run it on its own task rather than inside `select!`.
    pub async fn recv(&mut self) -> Result<ServerEvent, FrameError> {
        let payload = frame::read_frame(&mut self.reader, self.max_payload).await?;
        Ok(ServerEvent::from_payload(payload))
    }
}
