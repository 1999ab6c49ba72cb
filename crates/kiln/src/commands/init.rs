//! Scaffold a source tree.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use kiln_modal::{CALLBACK_SELECTOR, CLOSE_CLASS};
use kiln_pipeline::tasks::DEFAULT_SPRITE_TEMPLATE;

/// Directories created even when they start empty.
const ASSET_DIRS: &[&str] = &[
    "src/assets/fonts",
    "src/assets/images/sprite",
    "src/assets/misc",
];

/// Run the init command in `root`.
pub async fn run(root: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing kiln...");

    let src = root.join("src");
    if src.exists() && !yes {
        tracing::warn!("src/ directory already exists. Use --yes to overwrite.");
        return Ok(());
    }

    for dir in ASSET_DIRS {
        let path = root.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }

    for (relative, content) in scaffold_files() {
        let path = root.join(relative);
        if path.exists() && !yes {
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", relative))?;
        tracing::info!("Created {}", relative);
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'npm install' for the page scripts, then 'kiln' to start developing.");

    Ok(())
}

fn scaffold_files() -> Vec<(&'static str, String)> {
    vec![
        ("kiln.toml", DEFAULT_CONFIG.to_string()),
        ("package.json", DEFAULT_PACKAGE.to_string()),
        ("src/pages/index.hbs", DEFAULT_INDEX.to_string()),
        ("src/layouts/default.hbs", DEFAULT_LAYOUT.to_string()),
        ("src/data/site.json", DEFAULT_SITE_DATA.to_string()),
        ("src/db/products.json", "[]\n".to_string()),
        ("src/app.scss", DEFAULT_STYLES.to_string()),
        ("src/app.js", DEFAULT_SCRIPT.to_string()),
        (
            "src/components/main-header/main-header.hbs",
            DEFAULT_HEADER.to_string(),
        ),
        ("src/components/main-header/main-header.js", header_script()),
        ("src/components/callback/callback.hbs", callback_markup()),
        ("src/components/callback/callback.js", DEFAULT_CALLBACK_SCRIPT.to_string()),
        (
            "src/components/sprite/sprite-template.jinja",
            DEFAULT_SPRITE_TEMPLATE.to_string(),
        ),
        ("src/assets/images/svg/phone.svg", DEFAULT_ICON.to_string()),
    ]
}

/// Click handler for the header's callback link.
fn header_script() -> String {
    format!(
        r#"import $ from 'jquery';
import vex from 'vex-js';
import callback from '../callback/callback';

$('.main-header__callback-link').on('click', function (e) {{
  e.preventDefault();
  const modal = $('{selector}');

  if (!modal.length) {{
    console.error('Modal content {selector} does not exist');
    return;
  }}

  vex.open({{
    unsafeContent: modal.html(),
    closeClassName: '{close}',
    afterOpen: function () {{
      callback.mask();
    }}
  }});
}});
"#,
        selector = CALLBACK_SELECTOR,
        close = CLOSE_CLASS
    )
}

fn callback_markup() -> String {
    format!(
        r#"<div data-modal="callback" hidden>
  <form class="callback">
    <button type="button" class="{close}">&times;</button>
    <input class="callback__phone" name="phone" type="tel" placeholder="Phone">
    <button type="submit">Call me back</button>
  </form>
</div>
"#,
        close = CLOSE_CLASS
    )
}

const DEFAULT_CONFIG: &str = r#"# Kiln Configuration

[paths]
# Source tree
source = "src"

# Build output (deleted on every full build)
output = "public"

# Extra font directories copied into fonts/
extra_font_dirs = []

[server]
port = 8080

# Open a browser when the server starts
open = false
"#;

const DEFAULT_PACKAGE: &str = r#"{
  "private": true,
  "dependencies": {
    "jquery": "^3.7.1",
    "vex-js": "^4.1.0"
  }
}
"#;

const DEFAULT_INDEX: &str = r#"---
title: Home
---
<main class="page">
  <h1>{{ title }}</h1>
  <svg class="icon_phone"><use href="svg-symbols.svg#phone"></use></svg>
</main>
"#;

const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ title | default(site.title) }}</title>
  <link rel="stylesheet" href="{{ root }}css/style.css">
</head>
<body>
  {% include "main-header" %}
  {{ body }}
  {% include "callback" %}
  <script src="{{ root }}js/bundle.js"></script>
</body>
</html>
"#;

const DEFAULT_SITE_DATA: &str = r#"{
  "title": "My Site"
}
"#;

const DEFAULT_STYLES: &str = r#"@import "components/sprite/sprite-images";

body {
  margin: 0;
  font-family: sans-serif;
}

.main-header {
  display: flex;
  justify-content: space-between;
  padding: 1rem;
}
"#;

const DEFAULT_SCRIPT: &str = "import './components/main-header/main-header';\n";

const DEFAULT_HEADER: &str = r##"<header class="main-header">
  <a class="main-header__logo" href="{{ root }}index.html">{{ site.title }}</a>
  <a class="main-header__callback-link" href="#callback">Request a call</a>
</header>
"##;

const DEFAULT_CALLBACK_SCRIPT: &str = r#"import $ from 'jquery';

export default {
  mask() {
    $('.vex .callback__phone').on('input', function () {
      this.value = this.value.replace(/[^\d+()\- ]/g, '');
    });
  }
};
"#;

const DEFAULT_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
  <path d="M6.6 10.8a15.1 15.1 0 0 0 6.6 6.6l2.2-2.2a1 1 0 0 1 1-.25 11.4 11.4 0 0 0 3.6.57 1 1 0 0 1 1 1V20a1 1 0 0 1-1 1A17 17 0 0 1 3 4a1 1 0 0 1 1-1h3.5a1 1 0 0 1 1 1c0 1.25.2 2.45.57 3.57a1 1 0 0 1-.25 1z"/>
</svg>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_pipeline::{BuildConfig, Pipeline, TaskName};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn scaffolds_source_tree() {
        let temp = tempdir().unwrap();

        run(temp.path(), false).await.unwrap();

        for (relative, _) in scaffold_files() {
            assert!(temp.path().join(relative).exists(), "missing {}", relative);
        }
        assert!(temp.path().join("src/assets/images/sprite").is_dir());

        let script =
            fs::read_to_string(temp.path().join("src/components/main-header/main-header.js"))
                .unwrap();
        assert!(script.contains("$('[data-modal=callback]')"));
        assert!(script.contains("closeClassName: 'modal__close'"));

        let header =
            fs::read_to_string(temp.path().join("src/components/main-header/main-header.hbs"))
                .unwrap();
        assert!(header.contains(r##"href="#callback">Request a call</a>"##));
        assert!(header.trim_end().ends_with("</header>"));
    }

    #[tokio::test]
    async fn keeps_existing_tree_without_yes() {
        let temp = tempdir().unwrap();
        run(temp.path(), false).await.unwrap();
        let index = temp.path().join("src/pages/index.hbs");
        fs::write(&index, "mine").unwrap();

        run(temp.path(), false).await.unwrap();
        assert_eq!(fs::read_to_string(&index).unwrap(), "mine");

        run(temp.path(), true).await.unwrap();
        assert_eq!(fs::read_to_string(&index).unwrap(), DEFAULT_INDEX);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn scaffold_builds_without_packages() {
        let temp = tempdir().unwrap();
        run(temp.path(), false).await.unwrap();
        let pipeline = Pipeline::new(BuildConfig {
            source_dir: temp.path().join("src"),
            output_dir: temp.path().join("public"),
            ..Default::default()
        });

        let summary = pipeline.build().await.unwrap();

        // Scripts need jquery and vex from npm
        let failed: Vec<TaskName> = summary.failed.iter().map(|(task, _)| *task).collect();
        assert_eq!(failed, vec![TaskName::Scripts]);

        let public = temp.path().join("public");
        let html = fs::read_to_string(public.join("index.html")).unwrap();
        assert!(html.contains("<title>Home</title>"));
        assert!(html.contains("My Site"));
        assert!(html.contains(r#"data-modal="callback""#));
        assert!(public.join("css/style.css").exists());
        assert!(public.join("svg-symbols.svg").exists());
        assert!(public.join("db/products.json").exists());
    }
}
