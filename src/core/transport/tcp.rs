//! TCP transport: one rmcp session per accepted connection, line-delimited
//! JSON-RPC on each socket.
//!
//! Sessions share the server's dispatcher; nothing else is shared between
//! connections.

use std::net::SocketAddr;
use std::time::Duration;

use rmcp::ServiceExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, info, info_span, warn};

use super::{TransportError, TransportResult, config::TcpConfig};
use crate::core::McpServer;

/// Pause after a failed `accept` so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Accept connections until the process stops.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!(%addr, platform = %server.config().platform.platform, "Serving MCP over TCP");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!(%peer, "Failed to set TCP_NODELAY: {}", e);
                    }
                    let span = info_span!("tcp_session", %peer);
                    tokio::spawn(serve_connection(server.clone(), stream, peer).instrument(span));
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

/// Run one session to completion. Errors end only this connection.
async fn serve_connection(server: McpServer, stream: TcpStream, peer: SocketAddr) {
    info!("Client connected");

    let session = match server.serve(stream).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Session initialization failed: {}", e);
            return;
        }
    };

    match session.waiting().await {
        Ok(reason) => info!(?reason, "Client {} disconnected", peer),
        Err(e) => warn!("Session for {} ended with error: {}", peer, e),
    }
}
