//! Dependency graph of tasks and the scheduler that runs it.
//!
//! Nodes are tasks; an edge `a -> b` means `a` consumes something `b` writes,
//! so `a` may only start once `b` has succeeded. Ready nodes run concurrently
//! on the blocking pool.
//!
//! A failing node that others depend on aborts the run: nothing new is
//! started, in-flight nodes are awaited and the error is returned. A failing
//! node with no dependents is recorded in the summary and the rest carries on.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use crate::config::BuildConfig;
use crate::task::{run_task, Task, TaskError, TaskName, TaskReport};

/// Errors from building or running a graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Task '{0}' added twice")]
    DuplicateTask(TaskName),

    #[error("Unknown task '{0}'")]
    UnknownTask(TaskName),

    #[error("Dependency '{task}' -> '{on}' would create a cycle")]
    Cycle { task: TaskName, on: TaskName },

    #[error("Build aborted: '{task}' failed: {source}")]
    Aborted {
        task: TaskName,
        #[source]
        source: TaskError,
    },
}

/// Result of running a graph to completion.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub completed: Vec<TaskReport>,
    pub failed: Vec<(TaskName, TaskError)>,
    pub duration_ms: u64,
}

impl BuildSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn files_written(&self) -> usize {
        self.completed.iter().map(|r| r.files_written).sum()
    }
}

struct Node {
    task: Arc<dyn Task>,
    deps: BTreeSet<TaskName>,
}

/// A directed acyclic graph of tasks.
#[derive(Default)]
pub struct TaskGraph {
    nodes: BTreeMap<TaskName, Node>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: Arc<dyn Task>) -> Result<(), GraphError> {
        let name = task.name();
        if self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateTask(name));
        }
        self.nodes.insert(
            name,
            Node {
                task,
                deps: BTreeSet::new(),
            },
        );
        Ok(())
    }

    /// Declare that `task` must wait for `on`.
    pub fn depend(&mut self, task: TaskName, on: TaskName) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&on) {
            return Err(GraphError::UnknownTask(on));
        }
        if task == on || self.reaches(on, task) {
            return Err(GraphError::Cycle { task, on });
        }
        self.nodes
            .get_mut(&task)
            .ok_or(GraphError::UnknownTask(task))?
            .deps
            .insert(on);
        Ok(())
    }

    pub fn contains(&self, name: TaskName) -> bool {
        self.nodes.contains_key(&name)
    }

    pub fn dependencies(&self, name: TaskName) -> Option<&BTreeSet<TaskName>> {
        self.nodes.get(&name).map(|n| &n.deps)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `from` transitively depends on `to`.
    fn reaches(&self, from: TaskName, to: TaskName) -> bool {
        let mut stack = vec![from];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.deps.iter().copied());
            }
        }
        false
    }

    fn has_dependents(&self, name: TaskName) -> bool {
        self.nodes.values().any(|n| n.deps.contains(&name))
    }

    /// Run every node, respecting dependencies.
    pub async fn run(&self, config: Arc<BuildConfig>) -> Result<BuildSummary, GraphError> {
        let start = Instant::now();
        let mut summary = BuildSummary::default();
        let mut done: BTreeSet<TaskName> = BTreeSet::new();
        let mut started: BTreeSet<TaskName> = BTreeSet::new();
        let mut running = JoinSet::new();
        let mut ids = HashMap::new();
        let mut abort: Option<(TaskName, TaskError)> = None;

        loop {
            if abort.is_none() {
                for (name, node) in &self.nodes {
                    if started.contains(name) || !node.deps.is_subset(&done) {
                        continue;
                    }
                    started.insert(*name);
                    let task = Arc::clone(&node.task);
                    let config = Arc::clone(&config);
                    let handle = running.spawn_blocking(move || run_task(task.as_ref(), &config));
                    ids.insert(handle.id(), *name);
                }
            }

            let Some(joined) = running.join_next_with_id().await else {
                break;
            };

            let (name, result) = match joined {
                Ok((id, result)) => (ids[&id], result),
                Err(e) => (
                    ids[&e.id()],
                    Err(TaskError::Interrupted(e.to_string())),
                ),
            };

            match result {
                Ok(report) => {
                    done.insert(name);
                    summary.completed.push(report);
                }
                Err(e) if self.has_dependents(name) => {
                    if abort.is_none() {
                        abort = Some((name, e));
                    } else {
                        summary.failed.push((name, e));
                    }
                }
                Err(e) => summary.failed.push((name, e)),
            }
        }

        if let Some((task, source)) = abort {
            return Err(GraphError::Aborted { task, source });
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        Ok(summary)
    }
}
