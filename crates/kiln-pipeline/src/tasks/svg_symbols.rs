use std::fs;
use std::path::Path;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::config::BuildConfig;
use crate::glob::FileSet;
use crate::task::{write_file, Task, TaskError, TaskName};

/// Name of the combined document at the output root.
pub const SYMBOLS_FILE: &str = "svg-symbols.svg";

const EDITOR_PREFIXES: [&[u8]; 2] = [b"sodipodi", b"inkscape"];

/// Minifies every `assets/images/svg/**/*.svg` and combines them into one
/// document of `<symbol>` elements.
pub struct SvgSymbolsTask;

/// A minified icon, ready to become a `<symbol>`.
#[derive(Debug, PartialEq)]
struct Icon {
    view_box: Option<String>,
    body: String,
}

fn svg_error(path: &Path) -> impl Fn(String) -> TaskError + '_ {
    move |message| TaskError::Svg {
        path: path.to_path_buf(),
        message,
    }
}

fn is_editor_name(name: &[u8]) -> bool {
    EDITOR_PREFIXES.iter().any(|&prefix| {
        (name.starts_with(prefix) && name.get(prefix.len()) == Some(&b':'))
            || name.strip_prefix(b"xmlns:") == Some(prefix)
    })
}

fn is_dropped_element(name: &[u8]) -> bool {
    name == b"metadata" || is_editor_name(name)
}

/// Copy of `start` without editor attributes.
fn clean_start(start: &BytesStart, path: &Path) -> Result<BytesStart<'static>, TaskError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut cleaned = BytesStart::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| svg_error(path)(e.to_string()))?;
        if !is_editor_name(attr.key.as_ref()) {
            cleaned.push_attribute(attr);
        }
    }
    Ok(cleaned.into_owned())
}

/// `viewBox` of the root element, or one derived from its size.
fn root_view_box(root: &BytesStart) -> Option<String> {
    let mut width = None;
    let mut height = None;
    for attr in root.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"viewBox" => return Some(value),
            b"width" => width = Some(value.trim_end_matches("px").to_string()),
            b"height" => height = Some(value.trim_end_matches("px").to_string()),
            _ => {}
        }
    }
    Some(format!("0 0 {} {}", width?, height?))
}

fn minify(source: &str, path: &Path) -> Result<Icon, TaskError> {
    let fail = svg_error(path);
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new(Vec::new());

    let mut view_box = None;
    let mut root_seen = false;
    let mut depth = 0usize;
    let mut skipping = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| fail(format!("{} at byte {}", e, reader.error_position())))?;

        let write = match event {
            Event::Start(e) if !root_seen => {
                if e.name().as_ref() != b"svg" {
                    return Err(fail("root element is not <svg>".to_string()));
                }
                root_seen = true;
                depth = 1;
                view_box = root_view_box(&e);
                None
            }
            Event::Empty(e) if !root_seen => {
                if e.name().as_ref() != b"svg" {
                    return Err(fail("root element is not <svg>".to_string()));
                }
                root_seen = true;
                view_box = root_view_box(&e);
                break;
            }
            Event::Start(e) => {
                depth += 1;
                if skipping > 0 || is_dropped_element(e.name().as_ref()) {
                    skipping += 1;
                    None
                } else {
                    Some(Event::Start(clean_start(&e, path)?))
                }
            }
            Event::Empty(e) => {
                if skipping > 0 || is_dropped_element(e.name().as_ref()) {
                    None
                } else {
                    Some(Event::Empty(clean_start(&e, path)?))
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
                if skipping > 0 {
                    skipping -= 1;
                    None
                } else {
                    Some(Event::End(e.into_owned()))
                }
            }
            Event::Text(t) if root_seen && skipping == 0 => Some(Event::Text(t.into_owned())),
            Event::CData(c) if root_seen && skipping == 0 => Some(Event::CData(c.into_owned())),
            Event::Eof => break,
            // Comments, declarations, processing instructions, doctype
            _ => None,
        };

        if let Some(event) = write {
            writer
                .write_event(event)
                .map_err(|e| fail(e.to_string()))?;
        }
    }

    if !root_seen {
        return Err(fail("no <svg> element".to_string()));
    }

    let body = String::from_utf8(writer.into_inner()).map_err(|e| fail(e.to_string()))?;
    Ok(Icon { view_box, body })
}

fn combine(icons: &[(String, Icon)]) -> String {
    let mut out = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" style="position:absolute;width:0;height:0">"#,
    );
    for (stem, icon) in icons {
        let id = escape(stem.as_str());
        out.push_str(&format!("<symbol id=\"{id}\""));
        if let Some(view_box) = &icon.view_box {
            out.push_str(&format!(" viewBox=\"{}\"", escape(view_box.as_str())));
        }
        out.push_str(&format!(" class=\"icon_{id}\">{}</symbol>", icon.body));
    }
    out.push_str("</svg>");
    out
}

impl Task for SvgSymbolsTask {
    fn name(&self) -> TaskName {
        TaskName::SvgSymbols
    }

    fn run(&self, config: &BuildConfig) -> Result<usize, TaskError> {
        let set = FileSet::new(config.svg_dir(), &["**/*.svg"])?;
        let mut files = set.files();
        if files.is_empty() {
            return Ok(0);
        }
        // Symbol order follows file names, not directory nesting.
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));

        let icons = files
            .iter()
            .map(|relative| {
                let path = set.base().join(relative);
                let source = fs::read_to_string(&path).map_err(TaskError::io(&path))?;
                let stem = relative
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok((stem, minify(&source, &path)?))
            })
            .collect::<Result<Vec<_>, TaskError>>()?;

        write_file(&config.output_dir.join(SYMBOLS_FILE), combine(&icons))?;
        Ok(1)
    }
}
