//! Build configuration threaded into every task.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Development vs production behaviour.
///
/// Decided once at startup and carried in [`BuildConfig`]; tasks never read
/// the environment themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    /// Interpret the value of the build mode environment variable.
    ///
    /// Anything other than `production`/`prod` means development.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "production" || v == "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown build mode '{}'", other)),
        }
    }
}

/// Configuration for building the site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source tree root
    pub source_dir: PathBuf,

    /// Output tree root (deleted on every full build)
    pub output_dir: PathBuf,

    /// Development or production
    pub mode: BuildMode,

    /// Where bare script imports and Sass imports are looked up
    pub node_modules: Option<PathBuf>,

    /// Additional font directories copied next to the project fonts
    pub extra_font_dirs: Vec<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("public"),
            mode: BuildMode::Development,
            node_modules: None,
            extra_font_dirs: vec![],
        }
    }
}

impl BuildConfig {
    pub fn pages_dir(&self) -> PathBuf {
        self.source_dir.join("pages")
    }

    pub fn layouts_dir(&self) -> PathBuf {
        self.source_dir.join("layouts")
    }

    /// Partials and component scripts.
    pub fn partials_dir(&self) -> PathBuf {
        self.source_dir.join("components")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.source_dir.join("data")
    }

    pub fn style_entry(&self) -> PathBuf {
        self.source_dir.join("app.scss")
    }

    pub fn script_entry(&self) -> PathBuf {
        self.source_dir.join("app.js")
    }

    pub fn fonts_dir(&self) -> PathBuf {
        self.source_dir.join("assets/fonts")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.source_dir.join("assets/images")
    }

    pub fn sprite_dir(&self) -> PathBuf {
        self.images_dir().join("sprite")
    }

    pub fn svg_dir(&self) -> PathBuf {
        self.images_dir().join("svg")
    }

    pub fn misc_dir(&self) -> PathBuf {
        self.source_dir.join("assets/misc")
    }

    pub fn db_dir(&self) -> PathBuf {
        self.source_dir.join("db")
    }

    /// Template that renders the sprite style fragment.
    pub fn sprite_template(&self) -> PathBuf {
        self.partials_dir().join("sprite/sprite-template.jinja")
    }

    /// Style fragment generated by the sprite task, inside the source tree.
    pub fn sprite_fragment(&self) -> PathBuf {
        self.partials_dir().join("sprite/sprite-images.scss")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mode_from_env_value() {
        assert_eq!(BuildMode::from_env_value(Some("production")), BuildMode::Production);
        assert_eq!(BuildMode::from_env_value(Some(" PROD ")), BuildMode::Production);
        assert_eq!(BuildMode::from_env_value(Some("staging")), BuildMode::Development);
        assert_eq!(BuildMode::from_env_value(None), BuildMode::Development);
    }

    #[test]
    fn parses_mode_flag() {
        assert_eq!("dev".parse::<BuildMode>().unwrap(), BuildMode::Development);
        assert_eq!("Production".parse::<BuildMode>().unwrap(), BuildMode::Production);
        assert!("fast".parse::<BuildMode>().is_err());
    }

    #[test]
    fn derives_source_layout() {
        let config = BuildConfig::default();

        assert_eq!(config.sprite_dir(), PathBuf::from("src/assets/images/sprite"));
        assert_eq!(
            config.sprite_fragment(),
            PathBuf::from("src/components/sprite/sprite-images.scss")
        );
        assert_eq!(config.script_entry(), PathBuf::from("src/app.js"));
    }
}
