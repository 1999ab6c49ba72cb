use kiln_bundler::{bundle, BundleOptions};

use crate::config::BuildConfig;
use crate::task::{write_file, Task, TaskError, TaskName};

/// Bundles `app.js` and its imports into `js/bundle.js`.
pub struct ScriptsTask;

impl Task for ScriptsTask {
    fn name(&self) -> TaskName {
        TaskName::Scripts
    }

    fn run(&self, config: &BuildConfig) -> Result<usize, TaskError> {
        let entry = config.script_entry();
        if !entry.is_file() {
            return Err(TaskError::MissingInput(entry));
        }

        let options = BundleOptions {
            minify: config.mode.is_production(),
            source_map: config.mode.is_development(),
            node_modules: config.node_modules.clone(),
        };
        let bundle = bundle(&entry, &options)?;
        tracing::debug!("Bundled {} modules", bundle.modules);

        write_file(&config.output_dir.join("js/bundle.js"), bundle.code)?;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildMode;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn project(root: &Path, mode: BuildMode) -> BuildConfig {
        let config = BuildConfig {
            source_dir: root.join("src"),
            output_dir: root.join("public"),
            mode,
            ..Default::default()
        };
        let header = config.partials_dir().join("main-header/main-header.js");
        fs::create_dir_all(header.parent().unwrap()).unwrap();
        fs::write(
            &header,
            "export default function initHeader(selector) {\n  const links = [...document.querySelectorAll(selector)];\n  return links.length;\n}\n",
        )
        .unwrap();
        fs::write(
            config.script_entry(),
            "import initHeader from './components/main-header/main-header.js';\ninitHeader('[data-modal=callback]');\n",
        )
        .unwrap();
        config
    }

    #[test]
    fn development_bundle_has_source_map() {
        let temp = tempdir().unwrap();
        let config = project(temp.path(), BuildMode::Development);

        assert_eq!(ScriptsTask.run(&config).unwrap(), 1);

        let js = fs::read_to_string(config.output_dir.join("js/bundle.js")).unwrap();
        assert!(js.contains("components/main-header/main-header.js"));
        assert!(js.contains("sourceMappingURL=data:application/json"));
    }

    #[test]
    fn production_bundle_is_minified() {
        let temp = tempdir().unwrap();
        let prod = project(temp.path(), BuildMode::Production);
        let dev = BuildConfig {
            output_dir: temp.path().join("dev"),
            mode: BuildMode::Development,
            ..prod.clone()
        };

        ScriptsTask.run(&prod).unwrap();
        ScriptsTask.run(&dev).unwrap();

        let minified = fs::read_to_string(prod.output_dir.join("js/bundle.js")).unwrap();
        let readable = fs::read_to_string(dev.output_dir.join("js/bundle.js")).unwrap();
        assert!(!minified.contains("sourceMappingURL"));
        assert!(minified.lines().count() < readable.lines().count());
    }

    #[test]
    fn missing_entry_is_fatal() {
        let temp = tempdir().unwrap();
        let config = BuildConfig {
            source_dir: temp.path().join("src"),
            ..Default::default()
        };

        assert!(matches!(
            ScriptsTask.run(&config),
            Err(TaskError::MissingInput(_))
        ));
    }

    #[test]
    fn syntax_errors_fail_the_task() {
        let temp = tempdir().unwrap();
        let config = project(temp.path(), BuildMode::Development);
        fs::write(config.script_entry(), "const = ;").unwrap();

        assert!(matches!(ScriptsTask.run(&config), Err(TaskError::Script(_))));
    }
}
