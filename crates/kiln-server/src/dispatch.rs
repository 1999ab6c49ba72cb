//! Maps source changes to the tasks that own them.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use kiln_pipeline::{BuildConfig, FileSet, Pipeline, TaskError, TaskName};

use crate::watcher::{ChangeEvent, ChangeSource};

/// A glob set in the source tree and the task that rebuilds it.
#[derive(Debug, Clone)]
pub struct WatchRule {
    pub task: TaskName,
    files: FileSet,
}

impl WatchRule {
    fn new(task: TaskName, root: &Path, include: &[&str]) -> Result<Self, TaskError> {
        Ok(Self {
            task,
            files: FileSet::new(root, include)?,
        })
    }

    fn excluding(mut self, exclude: &[&str]) -> Result<Self, TaskError> {
        self.files = self.files.excluding(exclude)?;
        Ok(self)
    }

    /// Whether a path relative to the source root belongs to this rule.
    pub fn matches(&self, relative: &Path) -> bool {
        self.files.matches(relative)
    }
}

/// The standard watch registrations, relative to the source root.
pub fn watch_rules(config: &BuildConfig) -> Result<Vec<WatchRule>, TaskError> {
    let root = &config.source_dir;
    let sprite_template = relative_slash(&config.sprite_template(), root);

    Ok(vec![
        WatchRule::new(TaskName::Db, root, &["db/*.json"])?,
        WatchRule::new(TaskName::Views, root, &["**/*.{hbs,html}"])?,
        WatchRule::new(TaskName::Scripts, root, &["**/*.js"])?,
        WatchRule::new(TaskName::Styles, root, &["**/*.{css,scss}"])?,
        WatchRule::new(TaskName::Images, root, &["assets/images/**/*.*"])?
            .excluding(&["assets/images/sprite/*.*"])?,
        WatchRule::new(
            TaskName::Sprite,
            root,
            &["assets/images/sprite/*.*", sprite_template.as_str()],
        )?,
        WatchRule::new(TaskName::SvgSymbols, root, &["assets/images/svg/**/*.svg"])?,
    ])
}

fn relative_slash(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Runs the owning task for every change in the source tree.
pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
    rules: Vec<WatchRule>,
    roots: Vec<PathBuf>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<Pipeline>) -> Result<Self, TaskError> {
        let config = pipeline.config();
        let rules = watch_rules(config)?;

        // notify reports canonical paths on some platforms
        let mut roots = vec![config.source_dir.clone()];
        if let Ok(canonical) = config.source_dir.canonicalize() {
            if canonical != config.source_dir {
                roots.push(canonical);
            }
        }

        Ok(Self {
            pipeline,
            rules,
            roots,
        })
    }

    fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        self.roots.iter().find_map(|root| path.strip_prefix(root).ok())
    }

    /// Tasks owning any path of `event`, each named once.
    pub fn tasks_for(&self, event: &ChangeEvent) -> BTreeSet<TaskName> {
        event
            .paths
            .iter()
            .filter_map(|path| self.relative(path))
            .flat_map(|relative| {
                self.rules
                    .iter()
                    .filter(move |rule| rule.matches(relative))
                    .map(|rule| rule.task)
            })
            .collect()
    }

    /// Dispatch events until the source closes.
    ///
    /// Each matching task runs on its own tokio task; failures are logged and
    /// the loop keeps going.
    pub async fn run(&self, source: &impl ChangeSource) {
        let mut events = source.subscribe();

        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} change events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            for task in self.tasks_for(&event) {
                tracing::info!("Change detected, running '{}'", task);
                let pipeline = Arc::clone(&self.pipeline);
                tokio::spawn(async move {
                    // Errors are already logged by the task runner
                    let _ = pipeline.run(task).await;
                });
            }
        }
    }
}
