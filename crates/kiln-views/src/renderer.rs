//! Template environment for pages, layouts and partials.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use minijinja::{context, AutoEscape, Environment, Value};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::frontmatter::{extract_frontmatter, FrontmatterError};

/// Template file extensions recognised for pages, layouts and partials.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["hbs", "html"];

/// Layout used when a page does not name one.
pub const DEFAULT_LAYOUT: &str = "default";

/// Layout name that renders a page without any wrapper.
pub const NO_LAYOUT: &str = "none";

/// Where the view sources live.
#[derive(Debug, Clone)]
pub struct ViewSources {
    /// Page templates, rendered one-to-one into HTML files
    pub pages_dir: PathBuf,

    /// Layout templates, selected by the page's `layout` key
    pub layouts_dir: PathBuf,

    /// Partial templates, included by file stem
    pub partials_dir: PathBuf,

    /// Data files (JSON/YAML), exposed by file stem
    pub data_dir: PathBuf,
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Output path relative to the output root, with an `.html` extension
    pub output: PathBuf,

    /// Rendered HTML
    pub html: String,
}

/// Errors that can occur while rendering views.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Failed to read {path}: {message}")]
    ReadError { path: String, message: String },

    #[error("Invalid frontmatter in {path}: {source}")]
    Frontmatter {
        path: String,
        #[source]
        source: FrontmatterError,
    },

    #[error("Invalid data file {path}: {message}")]
    DataError { path: String, message: String },

    #[error("Template error in {path}: {source:#}")]
    Template {
        path: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Template environment loaded from disk.
///
/// Loading reads every layout, partial and data file afresh, so a new
/// renderer always reflects the current source tree.
pub struct ViewRenderer {
    env: Environment<'static>,
    data: BTreeMap<String, serde_json::Value>,
    sources: ViewSources,
}

impl ViewRenderer {
    /// Load layouts, partials and data files.
    pub fn load(sources: ViewSources) -> Result<Self, ViewError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        for path in template_files(&sources.partials_dir) {
            let name = file_stem(&path);
            let source = read(&path)?;
            if env.get_template(&name).is_ok() {
                tracing::warn!("Partial '{}' defined more than once, using {}", name, path.display());
            }
            env.add_template_owned(name, source)
                .map_err(|e| template_error(&path, e))?;
        }

        for path in template_files(&sources.layouts_dir) {
            let name = format!("layouts/{}", file_stem(&path));
            let source = read(&path)?;
            env.add_template_owned(name, source)
                .map_err(|e| template_error(&path, e))?;
        }

        let data = load_data(&sources.data_dir)?;

        Ok(Self { env, data, sources })
    }

    /// Render every page under the pages directory.
    pub fn render_all(&self) -> Result<Vec<RenderedPage>, ViewError> {
        let pages = template_files(&self.sources.pages_dir);

        pages
            .par_iter()
            .map(|path| {
                let relative = path
                    .strip_prefix(&self.sources.pages_dir)
                    .unwrap_or(path)
                    .to_path_buf();
                let source = read(path)?;
                self.render_page(&relative, &source)
            })
            .collect()
    }

    /// Render one page given its path relative to the pages directory.
    pub fn render_page(&self, relative: &Path, source: &str) -> Result<RenderedPage, ViewError> {
        let display = self.sources.pages_dir.join(relative).display().to_string();

        let (frontmatter, body) =
            extract_frontmatter(source).map_err(|e| ViewError::Frontmatter {
                path: display.clone(),
                source: e,
            })?;
        let frontmatter = frontmatter.unwrap_or_default();

        let mut vars: BTreeMap<String, serde_json::Value> = self.data.clone();
        vars.extend(frontmatter.vars.clone());
        vars.insert("page".to_string(), serde_json::Value::String(file_stem(relative)));
        // A path prefix, not text: must not be HTML-escaped.
        let root = Value::from_safe_string(root_prefix(relative));

        let name = format!("pages/{}", to_slash(relative));
        let page_html = self
            .env
            .render_named_str(
                &name,
                body,
                context! {
                    root => root.clone(),
                    ..Value::from_serialize(&vars)
                },
            )
            .map_err(|e| template_error_named(&display, e))?;

        let layout = frontmatter.layout.as_deref().unwrap_or(DEFAULT_LAYOUT);
        let html = if layout == NO_LAYOUT {
            page_html
        } else {
            let template = self
                .env
                .get_template(&format!("layouts/{}", layout))
                .map_err(|e| template_error_named(&display, e))?;
            template
                .render(context! {
                    body => Value::from_safe_string(page_html),
                    layout => layout,
                    root => root,
                    ..Value::from_serialize(&vars)
                })
                .map_err(|e| template_error_named(&display, e))?
        };

        Ok(RenderedPage {
            output: relative.with_extension("html"),
            html,
        })
    }
}

/// Template files under `dir`, sorted by path. A missing directory yields none.
fn template_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }

    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
        })
        .collect()
}

fn load_data(dir: &Path) -> Result<BTreeMap<String, serde_json::Value>, ViewError> {
    let mut data = BTreeMap::new();
    if !dir.exists() {
        return Ok(data);
    }

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content = match ext {
            "json" | "yml" | "yaml" => read(path)?,
            _ => continue,
        };

        let value: serde_json::Value = if ext == "json" {
            serde_json::from_str(&content).map_err(|e| ViewError::DataError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| ViewError::DataError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        };

        data.insert(file_stem(path), value);
    }

    Ok(data)
}

fn read(path: &Path) -> Result<String, ViewError> {
    fs::read_to_string(path).map_err(|e| ViewError::ReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative prefix from a page back to the site root (`""`, `"../"`, ...).
fn root_prefix(relative: &Path) -> String {
    let depth = relative
        .parent()
        .map(|p| p.components().filter(|c| matches!(c, Component::Normal(_))).count())
        .unwrap_or(0);
    "../".repeat(depth)
}

fn template_error(path: &Path, source: minijinja::Error) -> ViewError {
    template_error_named(&path.display().to_string(), source)
}

fn template_error_named(path: &str, source: minijinja::Error) -> ViewError {
    ViewError::Template {
        path: path.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sources(root: &Path) -> ViewSources {
        ViewSources {
            pages_dir: root.join("pages"),
            layouts_dir: root.join("layouts"),
            partials_dir: root.join("components"),
            data_dir: root.join("data"),
        }
    }

    fn site(root: &Path) {
        write(
            &root.join("layouts/default.html"),
            "<html><body>{% include \"main-header\" %}{{ body }}</body></html>",
        );
        write(
            &root.join("components/main-header/main-header.html"),
            "<header>{{ site.name }}</header>",
        );
        write(&root.join("data/site.json"), r#"{"name": "Kiln"}"#);
        write(
            &root.join("pages/index.hbs"),
            "---\ntitle: Home\n---\n<h1>{{ title }}</h1>",
        );
    }

    #[test]
    fn renders_page_inside_layout_with_partials_and_data() {
        let temp = tempdir().unwrap();
        site(temp.path());

        let renderer = ViewRenderer::load(sources(temp.path())).unwrap();
        let pages = renderer.render_all().unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].output, PathBuf::from("index.html"));
        assert_eq!(
            pages[0].html,
            "<html><body><header>Kiln</header><h1>Home</h1></body></html>"
        );
    }

    #[test]
    fn nested_pages_get_root_prefix() {
        let temp = tempdir().unwrap();
        site(temp.path());
        write(
            &temp.path().join("pages/blog/post.html"),
            "---\nlayout: none\n---\n<a href=\"{{ root }}index.html\">{{ page }}</a>",
        );

        let renderer = ViewRenderer::load(sources(temp.path())).unwrap();
        let page = renderer
            .render_page(
                Path::new("blog/post.html"),
                &fs::read_to_string(temp.path().join("pages/blog/post.html")).unwrap(),
            )
            .unwrap();

        assert_eq!(page.output, PathBuf::from("blog/post.html"));
        assert_eq!(page.html, "<a href=\"../index.html\">post</a>");
    }

    #[test]
    fn root_prefix_is_not_escaped_in_layouts_and_partials() {
        let temp = tempdir().unwrap();
        site(temp.path());
        write(
            &temp.path().join("layouts/nested.html"),
            "<link href=\"{{ root }}css/style.css\">{% include \"logo\" %}{{ body }}",
        );
        write(
            &temp.path().join("components/logo/logo.html"),
            "<a href=\"{{ root }}index.html\">logo</a>",
        );
        let source = "---\nlayout: nested\n---\n<img src=\"{{ root }}images/a.png\">";
        write(&temp.path().join("pages/docs/deep/page.html"), source);

        let renderer = ViewRenderer::load(sources(temp.path())).unwrap();
        let page = renderer
            .render_page(Path::new("docs/deep/page.html"), source)
            .unwrap();

        assert_eq!(
            page.html,
            "<link href=\"../../css/style.css\"><a href=\"../../index.html\">logo</a><img src=\"../../images/a.png\">"
        );
        assert!(!page.html.contains("&#x2f;"));
    }

    #[test]
    fn unknown_layout_is_a_template_error() {
        let temp = tempdir().unwrap();
        site(temp.path());

        let renderer = ViewRenderer::load(sources(temp.path())).unwrap();
        let result = renderer.render_page(Path::new("x.html"), "---\nlayout: missing\n---\n<p></p>");

        assert!(matches!(result, Err(ViewError::Template { .. })));
    }

    #[test]
    fn unknown_partial_is_a_template_error() {
        let temp = tempdir().unwrap();
        site(temp.path());

        let renderer = ViewRenderer::load(sources(temp.path())).unwrap();
        let result = renderer.render_page(Path::new("x.html"), "{% include \"nope\" %}");

        let err = result.unwrap_err();
        assert!(matches!(err, ViewError::Template { .. }));
        assert!(err.to_string().contains("x.html"));
    }

    #[test]
    fn layout_syntax_error_fails_loading() {
        let temp = tempdir().unwrap();
        write(&temp.path().join("layouts/default.html"), "{% if %}");

        let result = ViewRenderer::load(sources(temp.path()));

        assert!(matches!(result, Err(ViewError::Template { .. })));
    }

    #[test]
    fn escapes_data_values() {
        let temp = tempdir().unwrap();
        site(temp.path());

        let renderer = ViewRenderer::load(sources(temp.path())).unwrap();
        let page = renderer
            .render_page(Path::new("x.html"), "---\nlayout: none\nnote: \"<b>\"\n---\n{{ note }}")
            .unwrap();

        assert_eq!(page.html, "&lt;b&gt;");
    }

    #[test]
    fn missing_directories_render_nothing() {
        let temp = tempdir().unwrap();

        let renderer = ViewRenderer::load(sources(temp.path())).unwrap();

        assert!(renderer.render_all().unwrap().is_empty());
    }
}
