//! Watch command.

use std::sync::Arc;

use anyhow::{Context, Result};
use kiln_pipeline::Pipeline;
use kiln_server::{Dispatcher, FileWatcher};

/// Rerun the owning task of every changed source file until Ctrl-C.
pub async fn run(pipeline: Arc<Pipeline>) -> Result<()> {
    let source_dir = pipeline.config().source_dir.clone();
    let dispatcher = Dispatcher::new(pipeline)?;
    let watcher = FileWatcher::new(std::slice::from_ref(&source_dir))
        .with_context(|| format!("Failed to watch {}", source_dir.display()))?;

    tracing::info!("Watching {} for changes", source_dir.display());

    tokio::select! {
        _ = dispatcher.run(&watcher) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("Stopped watching"),
    }

    Ok(())
}
