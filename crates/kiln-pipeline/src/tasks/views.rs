use kiln_views::{minify_html, ViewRenderer, ViewSources};

use crate::config::BuildConfig;
use crate::task::{write_file, Task, TaskError, TaskName};

/// Renders `pages/**/*.{hbs,html}` into HTML documents.
///
/// Layouts, partials and data are reloaded from disk on every run.
pub struct ViewsTask;

impl ViewsTask {
    fn sources(config: &BuildConfig) -> ViewSources {
        ViewSources {
            pages_dir: config.pages_dir(),
            layouts_dir: config.layouts_dir(),
            partials_dir: config.partials_dir(),
            data_dir: config.data_dir(),
        }
    }
}

impl Task for ViewsTask {
    fn name(&self) -> TaskName {
        TaskName::Views
    }

    fn run(&self, config: &BuildConfig) -> Result<usize, TaskError> {
        let renderer = ViewRenderer::load(Self::sources(config))?;
        let pages = renderer.render_all()?;

        for page in &pages {
            let path = config.output_dir.join(&page.output);
            if config.mode.is_production() {
                write_file(&path, minify_html(&page.html))?;
            } else {
                write_file(&path, &page.html)?;
            }
        }

        Ok(pages.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildMode;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn project(root: &Path, mode: BuildMode) -> BuildConfig {
        let config = BuildConfig {
            source_dir: root.join("src"),
            output_dir: root.join("public"),
            mode,
            ..Default::default()
        };
        write(
            &config.layouts_dir().join("default.html"),
            "<html>\n  <body>\n    {{ body }}\n  </body>\n</html>\n",
        );
        write(
            &config.partials_dir().join("main-header/main-header.hbs"),
            "<header>{{ site.title }}</header>",
        );
        write(&config.data_dir().join("site.json"), r#"{"title": "Kiln"}"#);
        write(
            &config.pages_dir().join("index.hbs"),
            "---\ntitle: Home\n---\n{% include \"main-header\" %}\n<h1>{{ title }}</h1>",
        );
        write(
            &config.pages_dir().join("about/team.html"),
            "---\nlayout: none\n---\n<p>{{ page }}</p>",
        );
        config
    }

    #[test]
    fn renders_pages_with_layouts_partials_and_data() {
        let temp = tempdir().unwrap();
        let config = project(temp.path(), BuildMode::Development);

        assert_eq!(ViewsTask.run(&config).unwrap(), 2);

        let index = fs::read_to_string(config.output_dir.join("index.html")).unwrap();
        assert!(index.contains("<header>Kiln</header>"));
        assert!(index.contains("<h1>Home</h1>"));
        assert!(index.starts_with("<html>\n  <body>"));

        let team = fs::read_to_string(config.output_dir.join("about/team.html")).unwrap();
        assert_eq!(team, "<p>team</p>");
    }

    #[test]
    fn production_collapses_whitespace() {
        let temp = tempdir().unwrap();
        let config = project(temp.path(), BuildMode::Production);

        ViewsTask.run(&config).unwrap();

        let index = fs::read_to_string(config.output_dir.join("index.html")).unwrap();
        assert!(index.starts_with("<html><body>"));
    }

    #[test]
    fn sees_partial_changes_between_runs() {
        let temp = tempdir().unwrap();
        let config = project(temp.path(), BuildMode::Development);
        ViewsTask.run(&config).unwrap();

        write(
            &config.partials_dir().join("main-header/main-header.hbs"),
            "<header>changed</header>",
        );
        ViewsTask.run(&config).unwrap();

        let index = fs::read_to_string(config.output_dir.join("index.html")).unwrap();
        assert!(index.contains("<header>changed</header>"));
    }

    #[test]
    fn unknown_layout_fails() {
        let temp = tempdir().unwrap();
        let config = project(temp.path(), BuildMode::Development);
        write(
            &config.pages_dir().join("broken.hbs"),
            "---\nlayout: missing\n---\nhi",
        );

        assert!(matches!(ViewsTask.run(&config), Err(TaskError::View(_))));
    }
}
