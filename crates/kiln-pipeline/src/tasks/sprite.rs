use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{imageops, DynamicImage, ImageFormat, RgbaImage};
use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;

use crate::compress;
use crate::config::BuildConfig;
use crate::glob::FileSet;
use crate::packing::{pack, Layout, PackItem};
use crate::task::{write_file, Task, TaskError, TaskName};

const PADDING: u32 = 2;

/// Path of the composite as referenced from the compiled stylesheet.
const SPRITE_URL: &str = "../images/sprite.png";

/// Used when the source tree has no sprite template of its own.
pub const DEFAULT_SPRITE_TEMPLATE: &str = r#"{% for sprite in sprites %}
.icon-{{ sprite.name }} {
  background-image: url({{ sprite.image }});
  background-position: {{ sprite.offset_x }}px {{ sprite.offset_y }}px;
  width: {{ sprite.width }}px;
  height: {{ sprite.height }}px;
}
{% endfor %}
"#;

#[derive(Debug, Serialize)]
struct SpriteVars<'a> {
    name: &'a str,
    x: u32,
    y: u32,
    offset_x: i64,
    offset_y: i64,
    width: u32,
    height: u32,
    total_width: u32,
    total_height: u32,
    image: &'static str,
}

/// Packs `assets/images/sprite/*.png` into `images/sprite.png` and renders
/// the matching style fragment into the source tree.
pub struct SpriteTask;

impl SpriteTask {
    fn load(path: &Path) -> Result<RgbaImage, TaskError> {
        image::open(path)
            .map(|image| image.to_rgba8())
            .map_err(|e| TaskError::Image {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn compose(layout: &Layout, images: &[(String, RgbaImage)]) -> DynamicImage {
        let mut canvas = RgbaImage::new(layout.width, layout.height);
        for placement in &layout.placements {
            if let Some((_, image)) = images.iter().find(|(name, _)| *name == placement.name) {
                imageops::replace(&mut canvas, image, placement.x as i64, placement.y as i64);
            }
        }
        DynamicImage::ImageRgba8(canvas)
    }

    fn encode(image: &DynamicImage, production: bool) -> Result<Vec<u8>, image::ImageError> {
        if production {
            return compress::encode_png(image);
        }
        let mut out = Vec::new();
        image.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        Ok(out)
    }

    fn render_fragment(config: &BuildConfig, layout: &Layout) -> Result<String, TaskError> {
        let template_path = config.sprite_template();
        let source = match fs::read_to_string(&template_path) {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                DEFAULT_SPRITE_TEMPLATE.to_string()
            }
            Err(e) => return Err(TaskError::io(&template_path)(e)),
        };

        let sprites: Vec<SpriteVars> = layout
            .placements
            .iter()
            .map(|p| SpriteVars {
                name: &p.name,
                x: p.x,
                y: p.y,
                offset_x: -(p.x as i64),
                offset_y: -(p.y as i64),
                width: p.width,
                height: p.height,
                total_width: layout.width,
                total_height: layout.height,
                image: SPRITE_URL,
            })
            .collect();

        let template_error = |source| TaskError::Template {
            path: template_path.clone(),
            source,
        };

        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_template("sprite", &source).map_err(template_error)?;
        env.get_template("sprite")
            .and_then(|t| {
                t.render(context! {
                    sprites => sprites,
                    spritesheet => context! {
                        width => layout.width,
                        height => layout.height,
                        image => SPRITE_URL,
                    },
                })
            })
            .map_err(template_error)
    }
}

impl Task for SpriteTask {
    fn name(&self) -> TaskName {
        TaskName::Sprite
    }

    fn run(&self, config: &BuildConfig) -> Result<usize, TaskError> {
        let set = FileSet::new(config.sprite_dir(), &["*.png"])?;
        let images = set
            .files()
            .into_iter()
            .map(|relative| {
                let name = relative
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Self::load(&set.base().join(&relative)).map(|image| (name, image))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let items: Vec<PackItem> = images
            .iter()
            .map(|(name, image)| PackItem {
                name: name.clone(),
                width: image.width(),
                height: image.height(),
            })
            .collect();
        let layout = pack(&items, PADDING);

        let mut written = 0;

        if images.is_empty() {
            tracing::debug!("No sprite images in {}", set.base().display());
        } else {
            let sprite_path = config.output_dir.join("images/sprite.png");
            let bytes = Self::encode(&Self::compose(&layout, &images), config.mode.is_production())
                .map_err(|e| TaskError::Image {
                    path: sprite_path.clone(),
                    message: e.to_string(),
                })?;
            write_file(&sprite_path, bytes)?;
            written += 1;
        }

        // Left untouched when unchanged so the styles watcher is not retriggered.
        let fragment_path = config.sprite_fragment();
        let fragment = Self::render_fragment(config, &layout)?;
        let current = fs::read_to_string(&fragment_path).ok();
        if current.as_deref() != Some(fragment.as_str()) {
            write_file(&fragment_path, fragment)?;
            written += 1;
        }

        Ok(written)
    }
}
