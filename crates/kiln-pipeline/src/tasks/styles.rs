use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use grass::{Options, OutputStyle};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

use crate::config::BuildConfig;
use crate::task::{write_file, Task, TaskError, TaskName};

/// Browsers the production stylesheet is prefixed for.
pub const BROWSER_TARGETS: [&str; 2] = ["> 5%", "ff > 14"];

const OUTPUT_FILE: &str = "style.css";

/// Compiles `app.scss` into `css/style.css`.
///
/// Compile errors are logged and leave the previous stylesheet in place, so
/// a typo never stops the watch loop.
pub struct StylesTask;

impl StylesTask {
    fn compile(config: &BuildConfig) -> Result<String, TaskError> {
        let mut load_paths = vec![config.source_dir.clone(), config.partials_dir()];
        load_paths.extend(config.node_modules.iter().cloned());

        let options = Options::default()
            .load_paths(load_paths.as_slice())
            .style(OutputStyle::Expanded);

        grass::from_path(config.style_entry(), &options).map_err(|e| TaskError::Style(e.to_string()))
    }

    /// Attach an inline source map of the compiled stylesheet.
    ///
    /// grass does not emit source maps, so the map points into the compiled
    /// CSS (embedded as its only source) rather than back at the `.scss`
    /// partials. It still lets devtools show readable, expanded rules.
    fn with_source_map(css: &str) -> Result<String, TaskError> {
        let sheet = StyleSheet::parse(
            css,
            ParserOptions {
                filename: OUTPUT_FILE.to_string(),
                ..Default::default()
            },
        )
        .map_err(|e| TaskError::Style(e.to_string()))?;

        let mut map = SourceMap::new("/");
        map.add_source(OUTPUT_FILE);
        map.set_source_content(0, css)
            .map_err(|e| TaskError::Style(e.to_string()))?;

        let printed = sheet
            .to_css(PrinterOptions {
                source_map: Some(&mut map),
                ..Default::default()
            })
            .map_err(|e| TaskError::Style(e.to_string()))?;

        let mut mappings = Vec::new();
        map.write_vlq(&mut mappings)
            .map_err(|e| TaskError::Style(e.to_string()))?;
        let json = serde_json::json!({
            "version": 3,
            "file": OUTPUT_FILE,
            "sources": map.get_sources(),
            "sourcesContent": map.get_sources_content(),
            "names": map.get_names(),
            "mappings": String::from_utf8_lossy(&mappings),
        });

        Ok(format!(
            "{}\n/*# sourceMappingURL=data:application/json;base64,{} */\n",
            printed.code,
            STANDARD.encode(json.to_string())
        ))
    }

    /// Vendor-prefix for [`BROWSER_TARGETS`] and minify.
    fn optimize(css: &str) -> Result<String, TaskError> {
        let browsers = Browsers::from_browserslist(BROWSER_TARGETS)
            .map_err(|e| TaskError::Style(e.to_string()))?;
        let targets = Targets {
            browsers,
            ..Default::default()
        };

        let mut sheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| TaskError::Style(e.to_string()))?;
        sheet
            .minify(MinifyOptions {
                targets,
                ..Default::default()
            })
            .map_err(|e| TaskError::Style(e.to_string()))?;

        let printed = sheet
            .to_css(PrinterOptions {
                minify: true,
                targets,
                ..Default::default()
            })
            .map_err(|e| TaskError::Style(e.to_string()))?;

        Ok(printed.code)
    }

    fn render(config: &BuildConfig) -> Result<String, TaskError> {
        let css = Self::compile(config)?;
        if config.mode.is_production() {
            Self::optimize(&css)
        } else {
            Self::with_source_map(&css)
        }
    }

    fn output_path(config: &BuildConfig) -> PathBuf {
        config.output_dir.join("css").join(OUTPUT_FILE)
    }
}

impl Task for StylesTask {
    fn name(&self) -> TaskName {
        TaskName::Styles
    }

    fn run(&self, config: &BuildConfig) -> Result<usize, TaskError> {
        let entry = config.style_entry();
        if !entry.is_file() {
            return Err(TaskError::MissingInput(entry));
        }

        match Self::render(config) {
            Ok(css) => {
                write_file(&Self::output_path(config), css)?;
                Ok(1)
            }
            Err(e) => {
                tracing::error!("{}", e);
                Ok(0)
            }
        }
    }
}
