//! Task abstraction shared by the scheduler and the watch controller.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use kiln_bundler::BundleError;
use kiln_views::ViewError;

use crate::config::BuildConfig;

/// Every task the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskName {
    Clean,
    Sprite,
    SvgSymbols,
    Views,
    Styles,
    Scripts,
    Fonts,
    Images,
    Misc,
    Db,
}

impl TaskName {
    pub const ALL: [TaskName; 10] = [
        TaskName::Clean,
        TaskName::Sprite,
        TaskName::SvgSymbols,
        TaskName::Views,
        TaskName::Styles,
        TaskName::Scripts,
        TaskName::Fonts,
        TaskName::Images,
        TaskName::Misc,
        TaskName::Db,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskName::Clean => "clean",
            TaskName::Sprite => "sprite",
            TaskName::SvgSymbols => "svgSymbols",
            TaskName::Views => "views",
            TaskName::Styles => "styles",
            TaskName::Scripts => "scripts",
            TaskName::Fonts => "fonts",
            TaskName::Images => "images",
            TaskName::Misc => "misc",
            TaskName::Db => "db",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "svg-symbols" || s == "svg_symbols" {
            return Ok(TaskName::SvgSymbols);
        }
        TaskName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown task '{}'", s))
    }
}

/// Errors a task can fail with.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Required input not found: {0}")]
    MissingInput(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Script(#[from] BundleError),

    #[error("Template error in {path}: {source:#}")]
    Template {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    #[error("Stylesheet error: {0}")]
    Style(String),

    #[error("Image error in {path}: {message}")]
    Image { path: PathBuf, message: String },

    #[error("SVG error in {path}: {message}")]
    Svg { path: PathBuf, message: String },

    #[error("Invalid glob '{pattern}': {message}")]
    Glob { pattern: String, message: String },

    #[error("Task did not finish: {0}")]
    Interrupted(String),
}

impl TaskError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> TaskError + '_ {
        move |source| TaskError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of a successful task run.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: TaskName,

    /// Files created or overwritten
    pub files_written: usize,

    pub duration_ms: u64,
}

/// A named build step.
///
/// A task is a function of the source tree and the configuration: it reads
/// its inputs, writes its outputs and returns how many files it wrote.
pub trait Task: Send + Sync {
    fn name(&self) -> TaskName;

    fn run(&self, config: &BuildConfig) -> Result<usize, TaskError>;
}

/// Run a task with timing and logging.
pub fn run_task(task: &dyn Task, config: &BuildConfig) -> Result<TaskReport, TaskError> {
    let name = task.name();
    let start = Instant::now();
    tracing::debug!("Starting '{}'", name);

    match task.run(config) {
        Ok(files_written) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::info!(
                "Finished '{}': {} files in {}ms",
                name,
                files_written,
                duration_ms
            );
            Ok(TaskReport {
                task: name,
                files_written,
                duration_ms,
            })
        }
        Err(e) => {
            tracing::error!("'{}' failed: {}", name, e);
            Err(e)
        }
    }
}

/// Write a file, creating parent directories as needed.
pub(crate) fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), TaskError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(TaskError::io(parent))?;
    }
    fs::write(path, contents).map_err(TaskError::io(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_names_round_trip() {
        for name in TaskName::ALL {
            assert_eq!(name.as_str().parse::<TaskName>().unwrap(), name);
        }
    }

    #[test]
    fn accepts_kebab_case_svg_symbols() {
        assert_eq!("svg-symbols".parse::<TaskName>().unwrap(), TaskName::SvgSymbols);
        assert!("deploy".parse::<TaskName>().is_err());
    }

    struct Failing;

    impl Task for Failing {
        fn name(&self) -> TaskName {
            TaskName::Misc
        }

        fn run(&self, _config: &BuildConfig) -> Result<usize, TaskError> {
            Err(TaskError::MissingInput(PathBuf::from("nowhere")))
        }
    }

    #[test]
    fn run_task_passes_errors_through() {
        let result = run_task(&Failing, &BuildConfig::default());

        assert!(matches!(result, Err(TaskError::MissingInput(_))));
    }
}
