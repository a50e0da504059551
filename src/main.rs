//! Chat Broker - Entry Point
//!
//! Parses configuration, binds the listener and runs the accept loop.

use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_broker::config::{DEFAULT_ADDR, DEFAULT_OUTBOX_CAPACITY};
use chat_broker::frame::DEFAULT_MAX_PAYLOAD;
use chat_broker::{ChatServer, ServerConfig};

/// Multi-client TCP chat broker
#[derive(Parser)]
#[command(name = "chat_broker", version)]
struct Args {
    /// Address to listen on
    #[arg(env = "CHAT_BROKER_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,

    /// Largest payload a client may send, in bytes
    #[arg(long, env = "CHAT_BROKER_MAX_PAYLOAD", default_value_t = DEFAULT_MAX_PAYLOAD)]
    max_payload: usize,

    /// Messages buffered per connection before broadcasters wait
    #[arg(long, env = "CHAT_BROKER_OUTBOX", default_value_t = DEFAULT_OUTBOX_CAPACITY)]
    outbox_capacity: usize,

    /// Milliseconds a closing connection may spend flushing queued messages
    #[arg(long, env = "CHAT_BROKER_CLOSE_LINGER_MS", default_value_t = 2000)]
    close_linger_ms: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: args.addr,
            max_payload: args.max_payload,
            outbox_capacity: args.outbox_capacity,
            close_linger: Duration::from_millis(args.close_linger_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_broker=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_broker=info")),
        )
        .init();

    let config = ServerConfig::from(Args::parse());
    let server = ChatServer::bind(config).await?;

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
