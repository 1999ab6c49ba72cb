//! Asset build pipeline for static sites.
//!
//! Every build step is a [`Task`]. The [`Pipeline`] wires the standard tasks
//! into a [`TaskGraph`] so that `clean` runs first, the sprite and symbol
//! generators run next and everything else runs concurrently after them.

pub mod builder;
pub mod compress;
pub mod config;
pub mod glob;
pub mod graph;
pub mod packing;
pub mod task;
pub mod tasks;

pub use builder::Pipeline;
pub use config::{BuildConfig, BuildMode};
pub use glob::FileSet;
pub use graph::{BuildSummary, GraphError, TaskGraph};
pub use task::{run_task, Task, TaskError, TaskName, TaskReport};
