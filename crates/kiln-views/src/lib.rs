//! Page composition for kiln.
//!
//! Pages carry YAML frontmatter, name a layout, include partials and read
//! shared data files. Rendering produces one HTML document per page.

pub mod frontmatter;
pub mod minify;
pub mod renderer;

pub use frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};
pub use minify::minify_html;
pub use renderer::{RenderedPage, ViewError, ViewRenderer, ViewSources};
