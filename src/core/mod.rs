//! Process-level infrastructure: configuration, the unified error type, the
//! MCP server handler, outbound endpoint guarding and inbound transports.

pub mod config;
pub mod error;
pub mod security;
pub mod server;
pub mod transport;

pub use config::{Config, ConfigError, Platform};
pub use error::{Error, Result};
pub use security::{EndpointError, join_endpoint, split_path};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
