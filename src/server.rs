//! ChatServer listener
//!
//! Owns the listening socket and the shared client registry. Each accepted
//! connection gets its own task; the accept loop never waits on them.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::registry::ClientRegistry;

/// The chat broker
///
/// There is no connection cap and no read timeout: a peer that connects and
/// never sends holds its task until the socket closes.
pub struct ChatServer {
    listener: TcpListener,
    registry: Arc<ClientRegistry>,
    config: Arc<ServerConfig>,
}

impl ChatServer {
    /// Bind the listening socket described by `config`
    pub async fn bind(config: ServerConfig) -> Result<Self, AppError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        Ok(Self {
            listener,
            registry: Arc::new(ClientRegistry::new()),
            config: Arc::new(config),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared registry of handshaken clients
    pub fn registry(&self) -> Arc<ClientRegistry> {
        self.registry.clone()
    }

    /// Run the accept loop forever
    pub async fn run(self) {
        if let Ok(addr) = self.listener.local_addr() {
            info!("ChatServer listening on {}", addr);
        }
        let broadcaster =
            Broadcaster::with_max_payload(self.registry.clone(), self.config.max_payload);

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("Accepted connection from {}", addr);
                    let broadcaster = broadcaster.clone();
                    let config = self.config.clone();

                    // Spawn handler task for each connection
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, broadcaster, config).await {
                            warn!("Connection {} ended with error: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
