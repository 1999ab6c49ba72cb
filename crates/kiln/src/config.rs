//! Configuration file structure (kiln.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kiln_pipeline::{BuildConfig, BuildMode};
use kiln_server::DevServerConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct KilnConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct PathsConfig {
    #[serde(default = "default_source")]
    pub source: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Font directories copied next to the project fonts
    #[serde(default)]
    pub extra_font_dirs: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub open: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            extra_font_dirs: vec![],
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            open: false,
        }
    }
}

fn default_source() -> PathBuf {
    PathBuf::from("src")
}
fn default_output() -> PathBuf {
    PathBuf::from("public")
}
fn default_port() -> u16 {
    8080
}

impl KilnConfig {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the config file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: KilnConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Build settings with paths resolved against the config file's directory.
    pub fn build_config(&self, config_path: &Path, mode: BuildMode) -> BuildConfig {
        let base = config_path.parent().unwrap_or(Path::new(""));
        let source_dir = base.join(&self.paths.source);

        // Packages live next to the source tree
        let node_modules = source_dir
            .parent()
            .unwrap_or(Path::new(""))
            .join("node_modules");

        BuildConfig {
            output_dir: base.join(&self.paths.output),
            mode,
            node_modules: Some(node_modules),
            extra_font_dirs: self
                .paths
                .extra_font_dirs
                .iter()
                .map(|dir| base.join(dir))
                .collect(),
            source_dir,
        }
    }

    pub fn server_config(&self, root: &Path) -> DevServerConfig {
        DevServerConfig {
            root: root.to_path_buf(),
            port: self.server.port,
            open: self.server.open,
            ..Default::default()
        }
    }
}
