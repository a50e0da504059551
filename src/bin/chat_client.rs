//! Chat Broker - Command-line client
//!
//! Reads lines from stdin and sends them as chat; prints every line and roster
//! update the broker pushes back. `/quit` or end of input leaves the chat.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;
use tracing_subscriber::EnvFilter;

use chat_broker::message::DISCONNECT_MESSAGE;
use chat_broker::{connect, FrameError, ServerEvent};

/// Command-line chat client
#[derive(Parser)]
#[command(name = "chat_client", version)]
struct Args {
    /// Broker address
    #[arg(env = "CHAT_BROKER_ADDR", default_value = "127.0.0.1:5050")]
    addr: String,

    /// Display name (the broker falls back to your address if empty)
    #[arg(short, long, env = "CHAT_USERNAME", default_value = "")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_broker=warn")),
        )
        .init();

    let args = Args::parse();
    let (mut sender, mut receiver) = connect(&args.addr, &args.name).await?;
    println!("Connected to {}. Type /quit to leave.", args.addr);

    // Spawn read task (server frames -> stdout)
    let mut read_task = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(ServerEvent::Roster(names)) => println!("* Online: {}", names.join(", ")),
                Ok(ServerEvent::Line(line)) => println!("{}", line),
                Err(FrameError::ConnectionClosed) => {
                    println!("* Server closed the connection");
                    break;
                }
                Err(e) => {
                    error!("Connection error: {}", e);
                    break;
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line == "/quit" || line == DISCONNECT_MESSAGE => break,
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => sender.send_chat(&line).await?,
                None => break,
            },
            _ = &mut read_task => return Ok(()),
        }
    }

    sender.disconnect().await?;
    Ok(())
}
