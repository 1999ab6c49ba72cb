//! Bundler errors.

use std::path::PathBuf;

/// Errors that can occur while bundling.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Entry point not found: {0}")]
    EntryNotFound(PathBuf),

    #[error("Failed to read {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("Failed to parse {path}:\n{message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Failed to transform {path}:\n{message}")]
    TransformError { path: PathBuf, message: String },

    #[error("Cannot resolve '{specifier}' from {from}")]
    Unresolved { specifier: String, from: PathBuf },

    #[error("Failed to minify script: {0}")]
    MinifyError(String),
}

/// Join oxc diagnostics into a single message.
pub(crate) fn join_diagnostics<T: std::fmt::Display>(errors: &[T]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
