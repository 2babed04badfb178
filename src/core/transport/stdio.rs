//! STDIO transport: one rmcp session over stdin/stdout.
//!
//! Logs go to stderr, so stdout carries nothing but protocol frames.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

pub struct StdioTransport;

impl StdioTransport {
    /// Serve until the client closes stdin.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!(platform = %server.config().platform.platform, "Serving MCP over stdin/stdout");

        let session = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::Init(e.to_string()))?;

        let reason = session
            .waiting()
            .await
            .map_err(|e| TransportError::Session(e.to_string()))?;

        info!(?reason, "STDIO session closed");
        Ok(())
    }
}
