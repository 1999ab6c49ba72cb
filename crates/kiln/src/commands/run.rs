//! Single task command.

use anyhow::{Context, Result};
use kiln_pipeline::{Pipeline, TaskName};

/// Run one task on its own, without its dependencies.
pub async fn run(pipeline: &Pipeline, task: TaskName) -> Result<()> {
    pipeline
        .run(task)
        .await
        .with_context(|| format!("Task '{}' failed", task))?;
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

    #[tokio::test]
    async fn runs_only_the_named_task() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src/assets/misc")).unwrap();
        fs::write(temp.path().join("src/assets/misc/robots.txt"), "User-agent: *").unwrap();

        run(&pipeline(temp.path()), TaskName::Misc).await.unwrap();

        assert!(temp.path().join("public/robots.txt").exists());
        assert!(!temp.path().join("public/css").exists());
    }

    #[tokio::test]
    async fn missing_entry_names_the_task() {
        let temp = tempdir().unwrap();

        let err = run(&pipeline(temp.path()), TaskName::Scripts)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Task 'scripts' failed");
    }
}
