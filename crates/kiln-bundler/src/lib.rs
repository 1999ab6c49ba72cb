//! JavaScript module graph bundler for kiln.
//!
//! Follows the import graph of a single entry point, transpiles every module
//! to ES5 with oxc, rewrites ES module syntax into a small CommonJS-style
//! registry and concatenates the result into one script.

pub mod bundle;
pub mod error;
pub mod helpers;
pub mod minify;
pub mod module;
pub mod resolve;

pub use bundle::{bundle, Bundle, BundleOptions};
pub use error::BundleError;
pub use minify::minify_script;
pub use module::{compile_module, CompiledModule};
pub use resolve::ModuleResolver;
