//! Binary entry point: load configuration, set up logging, serve.

use anyhow::{Context, Result};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use devops_mcp_server::core::{Config, McpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    // Fail before touching the transport: a misconfigured platform never serves.
    let config = Config::from_env().context("failed to load configuration")?;

    init_logging(&config.logging.level);

    info!(
        "Starting {} v{} for {} ({})",
        config.server.name,
        config.server.version,
        config.platform.platform,
        config.transport.description()
    );
    info!("{}", config.platform.summary());
    if let Some(warning) = config.platform.tls_warning() {
        warn!("{}", warning);
    }

    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::new(config).context("failed to initialize server")?;

    transport.run(server).await?;

    info!("Server shutting down");
    Ok(())
}

/// Install the tracing subscriber. Output goes to stderr; stdout belongs to
/// the STDIO transport.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();
}
