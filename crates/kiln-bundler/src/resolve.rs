//! Module specifier resolution.
//!
//! Relative specifiers resolve against the importing file. Bare specifiers
//! resolve against a `node_modules` directory using the package manifest.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BundleError;

/// Extensions tried, in order, when a specifier omits one.
const EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "json"];

/// The subset of `package.json` used to find a package entry point.
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    browser: Option<serde_json::Value>,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    main: Option<String>,
}

impl PackageManifest {
    /// Entry file named by the manifest, if any.
    ///
    /// `browser` only counts when it is a plain string; the object form
    /// remaps individual files and is not supported.
    fn entry(&self) -> Option<&str> {
        if let Some(serde_json::Value::String(browser)) = &self.browser {
            return Some(browser);
        }
        self.module.as_deref().or(self.main.as_deref())
    }
}

/// Resolves import specifiers to files on disk.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    node_modules: Option<PathBuf>,
}

impl ModuleResolver {
    /// Create a resolver. Bare specifiers fail to resolve without `node_modules`.
    pub fn new(node_modules: Option<PathBuf>) -> Self {
        Self { node_modules }
    }

    /// Resolve `specifier` as imported from the file `from`.
    pub fn resolve(&self, specifier: &str, from: &Path) -> Result<PathBuf, BundleError> {
        let unresolved = || BundleError::Unresolved {
            specifier: specifier.to_string(),
            from: from.to_path_buf(),
        };

        if is_relative(specifier) {
            let base = from.parent().unwrap_or(Path::new("."));
            return resolve_file_or_dir(&base.join(specifier), &mut HashSet::new())
                .ok_or_else(unresolved);
        }

        let node_modules = self.node_modules.as_ref().ok_or_else(unresolved)?;
        let (package, subpath) = split_package(specifier);
        let package_dir = node_modules.join(package);

        let mut visited = HashSet::new();
        match subpath {
            Some(subpath) => {
                resolve_file_or_dir(&package_dir.join(subpath), &mut visited).ok_or_else(unresolved)
            }
            None => resolve_package(&package_dir, &mut visited).ok_or_else(unresolved),
        }
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
}

/// Split `@scope/pkg/sub/path` into (`@scope/pkg`, `Some("sub/path")`).
fn split_package(specifier: &str) -> (&str, Option<&str>) {
    let mut slashes = specifier.match_indices('/').map(|(i, _)| i);
    let boundary = if specifier.starts_with('@') {
        slashes.nth(1)
    } else {
        slashes.next()
    };

    match boundary {
        Some(i) => (&specifier[..i], Some(&specifier[i + 1..])),
        None => (specifier, None),
    }
}

/// `visited` holds the package directories already entered, so manifests
/// pointing back at their own package (or at each other) terminate.
fn resolve_file_or_dir(path: &Path, visited: &mut HashSet<PathBuf>) -> Option<PathBuf> {
    if path.is_file() {
        return Some(normalize(path));
    }

    for ext in EXTENSIONS {
        let mut candidate = path.as_os_str().to_owned();
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        if candidate.is_file() {
            return Some(normalize(&candidate));
        }
    }

    if path.is_dir() {
        return resolve_package(path, visited);
    }

    None
}

fn resolve_package(dir: &Path, visited: &mut HashSet<PathBuf>) -> Option<PathBuf> {
    if !visited.insert(normalize(dir)) {
        tracing::warn!("Package entry of {} loops back on itself", dir.display());
        return None;
    }

    let manifest_path = dir.join("package.json");
    if let Ok(content) = fs::read_to_string(&manifest_path) {
        match serde_json::from_str::<PackageManifest>(&content) {
            Ok(manifest) => {
                if let Some(entry) = manifest.entry() {
                    if let Some(found) = resolve_file_or_dir(&dir.join(entry), visited) {
                        return Some(found);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed {}: {}", manifest_path.display(), e);
            }
        }
    }

    let index = dir.join("index.js");
    index.is_file().then(|| normalize(&index))
}

/// Drop `.` components and fold `..` so every module has one canonical id.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
