//! Live reload server command.

use anyhow::Result;
use kiln_server::{DevServer, DevServerConfig};

/// Serve the output tree until interrupted.
pub async fn run(config: DevServerConfig) -> Result<()> {
    tracing::info!("Starting development server on port {}", config.port);

    DevServer::new(config).start().await?;

    Ok(())
}
