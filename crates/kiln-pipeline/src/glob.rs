//! Glob-selected file sets.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use wax::{Glob, Pattern};

use crate::task::TaskError;

/// Files under a base directory selected by include and exclude globs.
///
/// Patterns are matched against paths relative to the base directory.
#[derive(Debug, Clone)]
pub struct FileSet {
    base: PathBuf,
    include: Vec<Glob<'static>>,
    exclude: Vec<Glob<'static>>,
}

impl FileSet {
    pub fn new(base: impl Into<PathBuf>, include: &[&str]) -> Result<Self, TaskError> {
        Ok(Self {
            base: base.into(),
            include: compile(include)?,
            exclude: Vec::new(),
        })
    }

    /// Add patterns whose matches are dropped from the set.
    pub fn excluding(mut self, exclude: &[&str]) -> Result<Self, TaskError> {
        self.exclude.extend(compile(exclude)?);
        Ok(self)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether a path relative to the base belongs to the set.
    pub fn matches(&self, relative: &Path) -> bool {
        self.include.iter().any(|g| g.is_match(relative))
            && !self.exclude.iter().any(|g| g.is_match(relative))
    }

    /// Matching files as paths relative to the base, sorted.
    ///
    /// A missing base directory yields an empty set.
    pub fn files(&self) -> Vec<PathBuf> {
        if !self.base.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&self.base)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                e.path()
                    .strip_prefix(&self.base)
                    .ok()
                    .map(Path::to_path_buf)
            })
            .filter(|relative| self.matches(relative))
            .collect()
    }
}

fn compile(patterns: &[&str]) -> Result<Vec<Glob<'static>>, TaskError> {
    patterns
        .iter()
        .map(|pattern| {
            Glob::new(pattern)
                .map(Glob::into_owned)
                .map_err(|e| TaskError::Glob {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })
        })
        .collect()
}
