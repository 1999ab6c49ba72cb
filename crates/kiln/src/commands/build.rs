//! Full build command.

use anyhow::Result;
use kiln_pipeline::Pipeline;

/// Run the build command.
///
/// Fails when any task failed, after every independent task had its chance
/// to run.
pub async fn run(pipeline: &Pipeline) -> Result<()> {
    let summary = pipeline.build().await?;

    tracing::info!(
        "Built {} files with {} tasks in {}ms",
        summary.files_written(),
        summary.completed.len(),
        summary.duration_ms
    );

    if !summary.is_success() {
        let failed: Vec<String> = summary
            .failed
            .iter()
            .map(|(task, _)| task.to_string())
            .collect();
        anyhow::bail!("Build failed: {}", failed.join(", "));
    }

    tracing::info!("Output: {}", pipeline.config().output_dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_pipeline::BuildConfig;
    use std::fs;
    use tempfile::tempdir;

    fn pipeline(root: &std::path::Path) -> Pipeline {
        Pipeline::new(BuildConfig {
            source_dir: root.join("src"),
            output_dir: root.join("public"),
            ..Default::default()
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn builds_empty_source_tree() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src/db")).unwrap();
        fs::write(temp.path().join("src/app.scss"), "body { margin: 0; }").unwrap();
        fs::write(temp.path().join("src/app.js"), "export const x = 1;\n").unwrap();
        fs::write(temp.path().join("src/db/items.json"), "[]").unwrap();

        run(&pipeline(temp.path())).await.unwrap();

        assert!(temp.path().join("public/css/style.css").exists());
        assert!(temp.path().join("public/js/bundle.js").exists());
        assert!(temp.path().join("public/db/items.json").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_task_fails_the_build() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/app.scss"), "body { margin: 0; }").unwrap();

        // No app.js
        let err = run(&pipeline(temp.path())).await.unwrap_err();

        assert!(err.to_string().contains("scripts"));
        assert!(temp.path().join("public/css/style.css").exists());
    }
}
