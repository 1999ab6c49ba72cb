use std::fs;
use std::path::Path;

use image::ImageFormat;
use rayon::prelude::*;

use crate::compress;
use crate::config::BuildConfig;
use crate::glob::FileSet;
use crate::task::{write_file, Task, TaskError, TaskName};

/// Copies content images to `images/`, recompressing them in production.
///
/// Sprite sources are left to the sprite task.
pub struct ImagesTask;

impl ImagesTask {
    fn process(from: &Path, to: &Path, production: bool) -> Result<(), TaskError> {
        let bytes = fs::read(from).map_err(TaskError::io(from))?;

        let optimized = match ImageFormat::from_path(from) {
            Ok(format) if production => {
                compress::optimize(&bytes, format).map_err(|e| TaskError::Image {
                    path: from.to_path_buf(),
                    message: e.to_string(),
                })?
            }
            _ => None,
        };

        match optimized {
            Some(smaller) => {
                tracing::debug!(
                    "{}: {} -> {} bytes",
                    from.display(),
                    bytes.len(),
                    smaller.len()
                );
                write_file(to, smaller)
            }
            None => write_file(to, bytes),
        }
    }
}

impl Task for ImagesTask {
    fn name(&self) -> TaskName {
        TaskName::Images
    }

    fn run(&self, config: &BuildConfig) -> Result<usize, TaskError> {
        let set = FileSet::new(config.images_dir(), &["**/*.*"])?.excluding(&["sprite/*.*"])?;
        let dest = config.output_dir.join("images");
        let production = config.mode.is_production();

        let files = set.files();
        files
            .par_iter()
            .map(|relative| Self::process(&set.base().join(relative), &dest.join(relative), production))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(files.len())
    }
}
