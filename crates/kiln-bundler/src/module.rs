//! Per-module compilation: transpile with oxc, then rewrite ES module syntax
//! into calls against the bundle's module registry.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingIdentifier, CallExpression, Declaration, ExportAllDeclaration,
    ExportDefaultDeclarationKind, ExportNamedDeclaration, Expression, IdentifierReference,
    ImportDeclaration, ImportDeclarationSpecifier, ModuleExportName, ObjectProperty, Program,
    Statement,
};
use oxc_ast_visit::{walk, Visit};
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_semantic::{Scoping, SemanticBuilder, SymbolId};
use oxc_sourcemap::SourceMap;
use oxc_span::{GetSpan, SourceType, Span};
use oxc_transformer::{HelperLoaderMode, TransformOptions, Transformer};
use regex::Regex;

use crate::error::{join_diagnostics, BundleError};

/// Language level every module is lowered to.
///
/// oxc lowers arrow functions at this level but leaves other ES2015 syntax
/// (classes, template literals, `let`/`const`, destructuring, spread,
/// `for...of`) in place.
pub const TARGET: &str = "es5";

static REQUIRE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\(\s*["']([^"']+)["']\s*\)"#).expect("valid require regex")
});

/// A module ready to be placed in the bundle.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// Source file
    pub path: PathBuf,

    /// Factory body (runs with `require`, `module`, `exports` in scope)
    pub code: String,

    /// Specifiers from `import`/`export ... from`; these must resolve
    pub static_imports: BTreeSet<String>,

    /// Specifiers of literal `require()` calls found in the body
    pub requires: BTreeSet<String>,

    /// Source map of `code`, when requested
    pub map: Option<SourceMap>,
}

/// A text replacement over the transpiled module.
#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// ES module bindings collected while rewriting.
#[derive(Debug, Default)]
struct ModuleShape {
    is_esm: bool,
    /// exported name -> expression producing it
    exports: Vec<(String, String)>,
    edits: Vec<Edit>,
    static_imports: BTreeSet<String>,
    import_count: usize,
    /// imported local -> access on its module binding
    imports: HashMap<SymbolId, String>,
}

/// Compile one module.
///
/// `source_map_path` is the path recorded in the module's source map; no map
/// is produced when it is `None`.
pub fn compile_module(
    path: &Path,
    source: &str,
    source_map_path: Option<&Path>,
) -> Result<CompiledModule, BundleError> {
    let allocator = Allocator::default();

    let (mut program, source_type) = parse_either(&allocator, path, source)?;

    let mut options = TransformOptions::from_target(TARGET).map_err(|message| {
        BundleError::TransformError {
            path: path.to_path_buf(),
            message,
        }
    })?;
    // Helper calls go through `babelHelpers`, defined by the bundle prelude.
    options.helper_loader.mode = HelperLoaderMode::External;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let transformed = Transformer::new(&allocator, path, &options)
        .build_with_scoping(scoping, &mut program);
    if !transformed.errors.is_empty() {
        return Err(BundleError::TransformError {
            path: path.to_path_buf(),
            message: join_diagnostics(&transformed.errors),
        });
    }

    let generated = Codegen::new()
        .with_options(CodegenOptions {
            source_map_path: source_map_path.map(Path::to_path_buf),
            ..CodegenOptions::default()
        })
        .build(&program);

    let lowered = generated.code;
    let reparsed = Parser::new(&allocator, &lowered, source_type).parse();
    if !reparsed.errors.is_empty() {
        return Err(BundleError::TransformError {
            path: path.to_path_buf(),
            message: join_diagnostics(&reparsed.errors),
        });
    }

    let semantic = SemanticBuilder::new().build(&reparsed.program).semantic;
    let shape = collect_module_shape(&reparsed.program, &lowered, semantic.scoping());
    let code = apply_shape(&lowered, shape.edits.as_slice(), &shape);

    let requires = REQUIRE_CALL
        .captures_iter(&code)
        .map(|c| c[1].to_string())
        .collect();

    Ok(CompiledModule {
        path: path.to_path_buf(),
        code,
        static_imports: shape.static_imports,
        requires,
        map: generated.map,
    })
}

/// Parse as an ES module, falling back to a classic script for CommonJS
/// sources that rely on sloppy-mode syntax.
fn parse_either<'a>(
    allocator: &'a Allocator,
    path: &Path,
    source: &'a str,
) -> Result<(Program<'a>, SourceType), BundleError> {
    let module_type = SourceType::default().with_module(true);
    let parsed = Parser::new(allocator, source, module_type).parse();
    if parsed.errors.is_empty() && !parsed.panicked {
        return Ok((parsed.program, module_type));
    }

    let script_type = SourceType::default().with_module(false);
    let fallback = Parser::new(allocator, source, script_type).parse();
    if fallback.errors.is_empty() && !fallback.panicked {
        return Ok((fallback.program, script_type));
    }

    Err(BundleError::ParseError {
        path: path.to_path_buf(),
        message: join_diagnostics(&parsed.errors),
    })
}

fn collect_module_shape(program: &Program<'_>, text: &str, scoping: &Scoping) -> ModuleShape {
    let mut shape = ModuleShape::default();

    // Imports hoist, so bind them before looking at exports.
    for stmt in &program.body {
        if let Statement::ImportDeclaration(decl) = stmt {
            shape.is_esm = true;
            let specifier = decl.source.value.to_string();
            let call = format!("require({})", quote(&specifier));

            let text_out = match &decl.specifiers {
                Some(specifiers) if !specifiers.is_empty() => {
                    let binding = shape.next_import_binding();
                    let mut text_out = format!("var {} = __kiln_interop({});", binding, call);
                    for spec in specifiers {
                        match spec {
                            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                                shape.bind_import(&s.local, format!("{}[\"default\"]", binding));
                            }
                            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                                text_out.push_str(&format!(" var {} = {};", s.local.name, binding));
                            }
                            ImportDeclarationSpecifier::ImportSpecifier(s) => {
                                let access =
                                    format!("{}[{}]", binding, quote(&s.imported.name()));
                                shape.bind_import(&s.local, access);
                            }
                        }
                    }
                    text_out
                }
                _ => format!("{};", call),
            };

            shape.static_imports.insert(specifier);
            shape.replace(text, decl.span.start, decl.span.end, text_out);
        }
    }

    for stmt in &program.body {
        match stmt {
            Statement::ExportNamedDeclaration(decl) => {
                shape.is_esm = true;

                if let Some(declaration) = &decl.declaration {
                    for name in declared_names(declaration) {
                        shape.exports.push((name.clone(), name));
                    }
                    // Drop the `export` keyword, keep the declaration.
                    shape.replace(text, decl.span.start, declaration.span().start, String::new());
                    continue;
                }

                match &decl.source {
                    Some(source) => {
                        let specifier = source.value.to_string();
                        let binding = shape.next_import_binding();
                        for spec in &decl.specifiers {
                            let local = spec.local.name();
                            let access = if local.as_str() == "default" {
                                format!("__kiln_default({})", binding)
                            } else {
                                format!("{}[{}]", binding, quote(&local))
                            };
                            shape.exports.push((spec.exported.name().to_string(), access));
                        }
                        shape.static_imports.insert(specifier.clone());
                        shape.replace(
                            text,
                            decl.span.start,
                            decl.span.end,
                            format!("var {} = require({});", binding, quote(&specifier)),
                        );
                    }
                    None => {
                        for spec in &decl.specifiers {
                            let imported = match &spec.local {
                                ModuleExportName::IdentifierReference(ident) => {
                                    import_access(scoping, &shape.imports, ident)
                                }
                                _ => None,
                            };
                            let expr = imported
                                .map(str::to_string)
                                .unwrap_or_else(|| spec.local.name().to_string());
                            shape.exports.push((spec.exported.name().to_string(), expr));
                        }
                        shape.replace(text, decl.span.start, decl.span.end, String::new());
                    }
                }
            }

            Statement::ExportDefaultDeclaration(decl) => {
                shape.is_esm = true;
                let body_start = decl.declaration.span().start;

                let named = match &decl.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                        f.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                        c.id.as_ref().map(|id| id.name.to_string())
                    }
                    _ => None,
                };

                match named {
                    Some(name) => {
                        shape.exports.push(("default".to_string(), name));
                        shape.replace(text, decl.span.start, body_start, String::new());
                    }
                    None => {
                        shape
                            .exports
                            .push(("default".to_string(), "__kiln_default_export".to_string()));
                        shape.replace(
                            text,
                            decl.span.start,
                            body_start,
                            "var __kiln_default_export = ".to_string(),
                        );
                    }
                }
            }

            Statement::ExportAllDeclaration(decl) => {
                shape.is_esm = true;
                let specifier = decl.source.value.to_string();
                let call = format!("require({})", quote(&specifier));

                let replacement = match &decl.exported {
                    Some(exported) => {
                        let binding = shape.next_import_binding();
                        shape.exports.push((exported.name().to_string(), binding.clone()));
                        format!("var {} = {};", binding, call)
                    }
                    None => format!("__kiln_export_star(exports, {});", call),
                };

                shape.static_imports.insert(specifier);
                shape.replace(text, decl.span.start, decl.span.end, replacement);
            }

            _ => {}
        }
    }

    if !shape.imports.is_empty() {
        let mut references = ImportReferences {
            scoping,
            imports: &shape.imports,
            edits: Vec::new(),
        };
        references.visit_program(program);
        let edits = references.edits;
        shape.edits.extend(edits);
    }

    shape
}

/// The module-binding access an identifier stands for, when it refers to an
/// imported name.
fn import_access<'m>(
    scoping: &Scoping,
    imports: &'m HashMap<SymbolId, String>,
    ident: &IdentifierReference<'_>,
) -> Option<&'m str> {
    let reference = ident.reference_id.get()?;
    let symbol = scoping.get_reference(reference).symbol_id()?;
    imports.get(&symbol).map(String::as_str)
}

/// Rewrites every use of an imported name into a read of the exporting
/// module, so imports observe later assignments in that module.
struct ImportReferences<'s> {
    scoping: &'s Scoping,
    imports: &'s HashMap<SymbolId, String>,
    edits: Vec<Edit>,
}

impl<'s> ImportReferences<'s> {
    fn access(&self, ident: &IdentifierReference<'_>) -> Option<&'s str> {
        import_access(self.scoping, self.imports, ident)
    }

    fn rewrite(&mut self, span: Span, text: String) {
        self.edits.push(Edit {
            start: span.start as usize,
            end: span.end as usize,
            text,
        });
    }
}

impl<'a> Visit<'a> for ImportReferences<'_> {
    // Handled by the statement rewrite.
    fn visit_import_declaration(&mut self, _decl: &ImportDeclaration<'a>) {}

    fn visit_export_all_declaration(&mut self, _decl: &ExportAllDeclaration<'a>) {}

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(declaration) = &decl.declaration {
            self.visit_declaration(declaration);
        }
    }

    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        if let Some(access) = self.access(ident) {
            self.rewrite(ident.span, access.to_string());
        }
    }

    fn visit_object_property(&mut self, prop: &ObjectProperty<'a>) {
        if prop.shorthand {
            if let Expression::Identifier(ident) = &prop.value {
                if let Some(access) = self.access(ident) {
                    self.rewrite(prop.span, format!("{}: {}", ident.name, access));
                    return;
                }
            }
        }
        walk::walk_object_property(self, prop);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(ident) = &call.callee {
            if let Some(access) = self.access(ident) {
                // Imported functions are called without a receiver.
                self.rewrite(ident.span, format!("(0, {})", access));
                for argument in &call.arguments {
                    self.visit_argument(argument);
                }
                return;
            }
        }
        walk::walk_call_expression(self, call);
    }
}

impl ModuleShape {
    fn bind_import(&mut self, local: &BindingIdentifier<'_>, access: String) {
        if let Some(symbol) = local.symbol_id.get() {
            self.imports.insert(symbol, access);
        }
    }

    fn next_import_binding(&mut self) -> String {
        let name = format!("__kiln_import_{}", self.import_count);
        self.import_count += 1;
        name
    }

    /// Queue a replacement that keeps the line count of the replaced range,
    /// so the transpiler's source map still lines up.
    fn replace(&mut self, text: &str, start: u32, end: u32, replacement: String) {
        let (start, end) = (start as usize, end as usize);
        let newlines = text[start..end].matches('\n').count();
        let mut replacement = replacement;
        replacement.extend(std::iter::repeat_n('\n', newlines));
        self.edits.push(Edit {
            start,
            end,
            text: replacement,
        });
    }
}

fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    match declaration {
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .flat_map(|d| d.id.get_binding_identifiers())
            .map(|id| id.name.to_string())
            .collect(),
        Declaration::FunctionDeclaration(f) => {
            f.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::ClassDeclaration(c) => c.id.iter().map(|id| id.name.to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Apply edits and prepend the ES module prologue on the first line.
fn apply_shape(text: &str, edits: &[Edit], shape: &ModuleShape) -> String {
    let mut out = String::with_capacity(text.len() + 256);

    if shape.is_esm {
        out.push_str("\"use strict\"; Object.defineProperty(exports, \"__esModule\", { value: true });");
        if !shape.exports.is_empty() {
            let getters = shape
                .exports
                .iter()
                .map(|(name, expr)| format!("{}: function () {{ return {}; }}", quote(name), expr))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(" __kiln_export(exports, {{ {} }});", getters));
        }
        out.push(' ');
    }

    let mut cursor = 0;
    let mut sorted: Vec<&Edit> = edits.iter().collect();
    sorted.sort_by_key(|e| e.start);
    for edit in sorted {
        out.push_str(&text[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> CompiledModule {
        compile_module(Path::new("app.js"), source, None).unwrap()
    }

    #[test]
    fn rewrites_default_and_named_imports() {
        let module = compile("import $ from 'jquery';\nimport { mask, open as show } from './callback';\nmask($, show);\n");

        assert!(module
            .code
            .contains("var __kiln_import_0 = __kiln_interop(require(\"jquery\"));"));
        assert!(module.code.contains(
            "(0, __kiln_import_1[\"mask\"])(__kiln_import_0[\"default\"], __kiln_import_1[\"open\"]);"
        ));
        assert!(!module.code.contains("var mask"));
        assert!(!module.code.contains("import "));
        assert_eq!(
            module.static_imports.iter().cloned().collect::<Vec<_>>(),
            vec!["./callback".to_string(), "jquery".to_string()]
        );
    }

    #[test]
    fn imported_names_stay_live() {
        let module = compile(
            "import { count } from './counter';\nexport function read() { return count; }\n",
        );

        assert!(module.code.contains("return __kiln_import_0[\"count\"];"));
        assert!(!module.code.contains("var count"));
    }

    #[test]
    fn rewrites_imports_in_shorthand_and_reexports() {
        let module = compile(
            "import { mask } from './mask';\nexport default { mask };\nexport { mask as applyMask };\n",
        );

        assert!(module.code.contains("mask: __kiln_import_0[\"mask\"]"));
        assert!(module
            .code
            .contains("\"applyMask\": function () { return __kiln_import_0[\"mask\"]; }"));
    }

    #[test]
    fn shadowed_imports_are_left_alone() {
        let module = compile(
            "import { value } from './value';\nexport function id(value) { return value; }\n",
        );

        assert!(module.code.contains("return value;"));
    }

    #[test]
    fn side_effect_imports_only_require() {
        let module = compile("import './polyfill';\n");

        assert!(module.code.contains("require(\"./polyfill\");"));
        assert!(!module.code.contains("__kiln_import_"));
    }

    #[test]
    fn rewrites_exports_into_getters() {
        let module = compile("export const a = 1;\nexport function mask() { return a; }\nexport default { mask };\n");

        assert!(module.code.starts_with("\"use strict\";"));
        assert!(module.code.contains("\"a\": function () { return a; }"));
        assert!(module.code.contains("\"mask\": function () { return mask; }"));
        assert!(module.code.contains("\"default\": function () { return __kiln_default_export; }"));
        assert!(module.code.contains("var __kiln_default_export ="));
        assert!(module
            .code
            .lines()
            .all(|line| !line.trim_start().starts_with("export")));

        // Export syntax is only legal in module code.
        let allocator = Allocator::default();
        let script = Parser::new(&allocator, &module.code, SourceType::default().with_module(false))
            .parse();
        assert!(script.errors.is_empty());
    }

    #[test]
    fn reexports_from_other_modules() {
        let module = compile("export * from './a';\nexport { b as c } from './b';\n");

        assert!(module.code.contains("__kiln_export_star(exports, require(\"./a\"));"));
        assert!(module.code.contains("\"c\": function () { return __kiln_import_0[\"b\"]; }"));
        assert_eq!(module.static_imports.len(), 2);
    }

    #[test]
    fn leaves_commonjs_untouched() {
        let module = compile("var x = require('./x');\nmodule.exports = function () { return x; };\n");

        assert!(!module.code.contains("__esModule"));
        assert!(module.requires.contains("./x"));
        assert!(module.static_imports.is_empty());
    }

    #[test]
    fn falls_back_to_script_parsing() {
        // `with` is a syntax error in module code only.
        let module = compile("var o = { a: 1 };\nwith (o) { a = 2; }\n");

        assert!(module.code.contains("with"));
    }

    #[test]
    fn lowers_newer_syntax() {
        let module = compile("const x = 2 ** 3;\nconst y = x ?? 1;\n");

        assert!(!module.code.contains("**"));
        assert!(!module.code.contains("??"));
    }

    #[test]
    fn lowers_arrow_functions() {
        let module = compile("const double = (n) => n * 2;\nlist.map((item) => { return double(item); });\n");

        assert!(!module.code.contains("=>"));
        assert!(module.code.contains("function"));
    }

    #[test]
    fn reports_parse_errors() {
        let result = compile_module(Path::new("broken.js"), "let = ;;; {", None);

        assert!(matches!(result, Err(BundleError::ParseError { .. })));
    }

    #[test]
    fn produces_source_map_on_request() {
        let module =
            compile_module(Path::new("app.js"), "let a = 1;\n", Some(Path::new("app.js"))).unwrap();

        assert!(module.map.is_some());
    }
}
