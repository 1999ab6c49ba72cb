//! Default workflow: build, then watch and serve.

use std::sync::Arc;

use anyhow::Result;
use kiln_pipeline::Pipeline;
use kiln_server::DevServerConfig;

use super::{build, serve, watch};

/// Run the dev workflow.
pub async fn run(pipeline: Arc<Pipeline>, server: DevServerConfig) -> Result<()> {
    // Keep going on a broken build so saving a fix recovers
    if let Err(e) = build::run(&pipeline).await {
        tracing::error!("{:#}", e);
        tracing::warn!("Watching anyway, fix the errors above");
    }

    // Watch returns on Ctrl-C, which also ends the server
    tokio::select! {
        result = watch::run(pipeline) => result,
        result = serve::run(server) => result,
    }
}
