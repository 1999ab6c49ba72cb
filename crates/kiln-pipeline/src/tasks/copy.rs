use std::fs;
use std::path::PathBuf;

use crate::config::BuildConfig;
use crate::glob::FileSet;
use crate::task::{Task, TaskError, TaskName};

/// Copies glob-selected files verbatim into an output subdirectory.
///
/// Relative paths below each source root are preserved. A root that does not
/// exist, or matches nothing, is a no-op.
pub struct CopyTask {
    name: TaskName,
    roots: fn(&BuildConfig) -> Vec<PathBuf>,
    include: &'static [&'static str],
    dest: &'static str,
}

impl CopyTask {
    /// `assets/fonts/**/*.*` plus configured extra font directories to `fonts/`.
    pub fn fonts() -> Self {
        Self {
            name: TaskName::Fonts,
            roots: |config| {
                let mut roots = vec![config.fonts_dir()];
                roots.extend(config.extra_font_dirs.iter().cloned());
                roots
            },
            include: &["**/*.*"],
            dest: "fonts",
        }
    }

    /// `assets/misc/**/*.*` to the output root.
    pub fn misc() -> Self {
        Self {
            name: TaskName::Misc,
            roots: |config| vec![config.misc_dir()],
            include: &["**/*.*"],
            dest: "",
        }
    }

    /// `db/**/*.json` to `db/`.
    pub fn db() -> Self {
        Self {
            name: TaskName::Db,
            roots: |config| vec![config.db_dir()],
            include: &["**/*.json"],
            dest: "db",
        }
    }
}

impl Task for CopyTask {
    fn name(&self) -> TaskName {
        self.name
    }

    fn run(&self, config: &BuildConfig) -> Result<usize, TaskError> {
        let dest = config.output_dir.join(self.dest);
        let mut copied = 0;

        for root in (self.roots)(config) {
            let set = FileSet::new(root, self.include)?;
            for relative in set.files() {
                let from = set.base().join(&relative);
                let to = dest.join(&relative);
                if let Some(parent) = to.parent() {
                    fs::create_dir_all(parent).map_err(TaskError::io(parent))?;
                }
                fs::copy(&from, &to).map_err(TaskError::io(&from))?;
                copied += 1;
            }
        }

        Ok(copied)
    }
}
