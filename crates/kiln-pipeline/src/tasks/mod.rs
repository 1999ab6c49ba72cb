//! The standard build tasks.

mod clean;
mod copy;
mod images;
mod scripts;
mod sprite;
mod styles;
mod svg_symbols;
mod views;

pub use clean::CleanTask;
pub use copy::CopyTask;
pub use images::ImagesTask;
pub use scripts::ScriptsTask;
pub use sprite::{SpriteTask, DEFAULT_SPRITE_TEMPLATE};
pub use styles::StylesTask;
pub use svg_symbols::{SvgSymbolsTask, SYMBOLS_FILE};
pub use views::ViewsTask;
