//! Module graph traversal and bundle assembly.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use oxc_sourcemap::ConcatSourceMapBuilder;

use crate::error::BundleError;
use crate::helpers::{uses_helpers, HELPERS};
use crate::minify::minify_script;
use crate::module::{compile_module, CompiledModule};
use crate::resolve::ModuleResolver;

/// Options for a bundling run.
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    /// Minify the final bundle
    pub minify: bool,

    /// Append an inline source map
    pub source_map: bool,

    /// Where bare specifiers are looked up
    pub node_modules: Option<PathBuf>,
}

/// Result of bundling an entry point.
#[derive(Debug)]
pub struct Bundle {
    /// Bundled script
    pub code: String,

    /// Number of modules included
    pub modules: usize,
}

/// A compiled module placed in the registry.
struct Entry {
    id: String,
    deps: BTreeMap<String, String>,
    module: CompiledModule,
}

/// Bundle `entry` and everything it imports into a single script.
pub fn bundle(entry: &Path, options: &BundleOptions) -> Result<Bundle, BundleError> {
    if !entry.is_file() {
        return Err(BundleError::EntryNotFound(entry.to_path_buf()));
    }

    let root = entry.parent().unwrap_or(Path::new(".")).to_path_buf();
    let resolver = ModuleResolver::new(options.node_modules.clone());

    let mut ordered = Vec::new();
    let mut seen = HashMap::new();
    visit(
        &resolver,
        &root,
        entry,
        options.source_map,
        &mut seen,
        &mut ordered,
    )?;

    let entry_id = module_id(&root, entry);
    let (code, map_sources) = assemble(&ordered, &entry_id);

    let code = if options.minify {
        minify_script(&code)?
    } else if options.source_map {
        let maps: Vec<_> = map_sources
            .iter()
            .filter_map(|(index, line)| ordered[*index].module.map.as_ref().map(|m| (m, *line)))
            .collect();
        let map = ConcatSourceMapBuilder::from_sourcemaps(&maps).into_sourcemap();
        format!("{}\n//# sourceMappingURL={}\n", code, map.to_data_url())
    } else {
        code
    };

    tracing::debug!("Bundled {} modules from {}", ordered.len(), entry.display());

    Ok(Bundle {
        code,
        modules: ordered.len(),
    })
}

/// Depth-first traversal; dependencies are emitted before their importers.
fn visit(
    resolver: &ModuleResolver,
    root: &Path,
    path: &Path,
    source_map: bool,
    seen: &mut HashMap<PathBuf, String>,
    ordered: &mut Vec<Entry>,
) -> Result<String, BundleError> {
    if let Some(id) = seen.get(path) {
        return Ok(id.clone());
    }

    let id = module_id(root, path);
    seen.insert(path.to_path_buf(), id.clone());

    let source = fs::read_to_string(path).map_err(|e| BundleError::ReadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let module = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        json_module(path, &source)
    } else {
        let map_path = source_map.then(|| PathBuf::from(&id));
        compile_module(path, &source, map_path.as_deref())?
    };

    let mut deps = BTreeMap::new();
    for specifier in &module.static_imports {
        let resolved = resolver.resolve(specifier, path)?;
        let dep_id = visit(resolver, root, &resolved, source_map, seen, ordered)?;
        deps.insert(specifier.clone(), dep_id);
    }
    for specifier in module.requires.difference(&module.static_imports) {
        // Literal require() calls in CommonJS code may sit behind runtime
        // checks, so a miss here is not fatal.
        match resolver.resolve(specifier, path) {
            Ok(resolved) => {
                let dep_id = visit(resolver, root, &resolved, source_map, seen, ordered)?;
                deps.insert(specifier.clone(), dep_id);
            }
            Err(e) => tracing::warn!("Skipping require: {}", e),
        }
    }

    ordered.push(Entry {
        id: id.clone(),
        deps,
        module,
    });
    Ok(id)
}

fn json_module(path: &Path, source: &str) -> CompiledModule {
    CompiledModule {
        path: path.to_path_buf(),
        code: format!("module.exports = {};", source.trim()),
        static_imports: Default::default(),
        requires: Default::default(),
        map: None,
    }
}

/// Stable id for a module: its path relative to the entry directory.
fn module_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the bundle text. Also returns, per module with a map, the line
/// where its body starts.
fn assemble(entries: &[Entry], entry_id: &str) -> (String, Vec<(usize, u32)>) {
    let mut out = String::from(PRELUDE);
    let mut offsets = Vec::new();

    if entries.iter().any(|entry| uses_helpers(&entry.module.code)) {
        out.push_str(HELPERS);
    }

    for (index, entry) in entries.iter().enumerate() {
        let deps = serde_json::to_string(&entry.deps).unwrap_or_else(|_| "{}".to_string());
        out.push_str(&format!(
            "__kiln_modules[{}] = {{ deps: {}, factory: function (require, module, exports) {{\n",
            serde_json::Value::String(entry.id.clone()),
            deps
        ));

        let line = out.matches('\n').count() as u32;
        if entry.module.map.is_some() {
            offsets.push((index, line));
        }

        out.push_str(&entry.module.code);
        if !entry.module.code.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("} };\n");
    }

    out.push_str(&format!(
        "__kiln_load({});\n}})();\n",
        serde_json::Value::String(entry_id.to_string())
    ));

    (out, offsets)
}

const PRELUDE: &str = r#"(function () {
var __kiln_modules = {};
var __kiln_cache = {};
function __kiln_load(id) {
  var cached = __kiln_cache[id];
  if (cached) { return cached.exports; }
  var def = __kiln_modules[id];
  var module = { exports: {} };
  __kiln_cache[id] = module;
  def.factory.call(module.exports, function (specifier) {
    var dep = def.deps[specifier];
    if (dep === undefined) { throw new Error("Cannot find module '" + specifier + "' from " + id); }
    return __kiln_load(dep);
  }, module, module.exports);
  return module.exports;
}
function __kiln_default(m) { return m && m.__esModule ? m["default"] : m; }
function __kiln_interop(m) {
  if (m && m.__esModule) { return m; }
  var ns = Object.create(m !== null && (typeof m === "object" || typeof m === "function") ? m : null);
  ns["default"] = m;
  return ns;
}
function __kiln_export(exports, getters) {
  Object.keys(getters).forEach(function (name) {
    Object.defineProperty(exports, name, { enumerable: true, get: getters[name] });
  });
}
function __kiln_export_star(exports, m) {
  Object.keys(m).forEach(function (name) {
    if (name === "default" || name === "__esModule" || Object.prototype.hasOwnProperty.call(exports, name)) { return; }
    Object.defineProperty(exports, name, { enumerable: true, get: function () { return m[name]; } });
  });
}
"#;
