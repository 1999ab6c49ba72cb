//! The standard pipeline: every task wired into the build graph.

use std::sync::Arc;

use crate::config::BuildConfig;
use crate::graph::{BuildSummary, GraphError, TaskGraph};
use crate::task::{run_task, Task, TaskError, TaskName, TaskReport};
use crate::tasks::{
    CleanTask, CopyTask, ImagesTask, ScriptsTask, SpriteTask, StylesTask, SvgSymbolsTask,
    ViewsTask,
};

/// Tasks that must finish before the concurrent phase starts.
const BARRIER: [TaskName; 2] = [TaskName::Sprite, TaskName::SvgSymbols];

/// Builds a site from a [`BuildConfig`].
pub struct Pipeline {
    config: Arc<BuildConfig>,
}

impl Pipeline {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The task registered under `name`.
    pub fn task_for(name: TaskName) -> Arc<dyn Task> {
        match name {
            TaskName::Clean => Arc::new(CleanTask),
            TaskName::Sprite => Arc::new(SpriteTask),
            TaskName::SvgSymbols => Arc::new(SvgSymbolsTask),
            TaskName::Views => Arc::new(ViewsTask),
            TaskName::Styles => Arc::new(StylesTask),
            TaskName::Scripts => Arc::new(ScriptsTask),
            TaskName::Fonts => Arc::new(CopyTask::fonts()),
            TaskName::Images => Arc::new(ImagesTask),
            TaskName::Misc => Arc::new(CopyTask::misc()),
            TaskName::Db => Arc::new(CopyTask::db()),
        }
    }

    /// `clean`, then the sprite and symbol generators, then everything else.
    pub fn standard_graph() -> Result<TaskGraph, GraphError> {
        let mut graph = TaskGraph::new();
        for name in TaskName::ALL {
            graph.add(Self::task_for(name))?;
        }

        for barrier in BARRIER {
            graph.depend(barrier, TaskName::Clean)?;
        }
        for name in TaskName::ALL {
            if name == TaskName::Clean || BARRIER.contains(&name) {
                continue;
            }
            for barrier in BARRIER {
                graph.depend(name, barrier)?;
            }
        }

        Ok(graph)
    }

    /// Full build from a clean output tree.
    pub async fn build(&self) -> Result<BuildSummary, GraphError> {
        tracing::info!(
            "Building {} -> {} ({})",
            self.config.source_dir.display(),
            self.config.output_dir.display(),
            self.config.mode
        );
        Self::standard_graph()?.run(Arc::clone(&self.config)).await
    }

    /// Run a single task on the blocking pool.
    pub async fn run(&self, name: TaskName) -> Result<TaskReport, TaskError> {
        let config = Arc::clone(&self.config);
        tokio::task::spawn_blocking(move || run_task(Self::task_for(name).as_ref(), &config))
            .await
            .map_err(|e| TaskError::Interrupted(e.to_string()))?
    }
}
