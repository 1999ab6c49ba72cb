use std::fs;

use crate::config::BuildConfig;
use crate::task::{Task, TaskError, TaskName};

/// Removes the output tree.
pub struct CleanTask;

impl Task for CleanTask {
    fn name(&self) -> TaskName {
        TaskName::Clean
    }

    fn run(&self, config: &BuildConfig) -> Result<usize, TaskError> {
        let output = &config.output_dir;
        if output.exists() {
            fs::remove_dir_all(output).map_err(TaskError::io(output))?;
            tracing::debug!("Removed {}", output.display());
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn removes_output_tree() {
        let temp = tempdir().unwrap();
        let output = temp.path().join("public");
        fs::create_dir_all(output.join("css")).unwrap();
        fs::write(output.join("css/style.css"), "a{}").unwrap();

        let config = BuildConfig {
            output_dir: output.clone(),
            ..Default::default()
        };
        CleanTask.run(&config).unwrap();

        assert!(!output.exists());
    }

    #[test]
    fn absent_output_is_fine() {
        let temp = tempdir().unwrap();
        let config = BuildConfig {
            output_dir: temp.path().join("missing"),
            ..Default::default()
        };

        assert_eq!(CleanTask.run(&config).unwrap(), 0);
    }
}
