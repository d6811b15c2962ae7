//! Single-line text shaping, measurement and glyph outlines using cosmic-text.
//!
//! `measure_text_width` and `draw_text` both go through [`shape_line`], so a
//! measured width is exactly the width the text is laid out with.

use crate::font_config::{FontLibrary, ResolvedFamily};
use crate::style::TextStyle;
use cosmic_text::{Attrs, Buffer, CacheKeyFlags, Command, Family, Metrics, Shaping, Style, Weight};
use tiny_skia::Transform;

/// Line height multiplier used for the shaping buffer.
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// A shaped single line of text.
pub(crate) struct ShapedLine {
    buffer: Buffer,
    /// Advance width of the whole line in pixels.
    pub width: f32,
}

/// Replace whitespace control characters with spaces, as canvas text drawing does.
fn normalize_whitespace(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect()
}

/// Shape `text` as one line with the font attributes of `style`.
///
/// Returns `None` when there is nothing to lay out: empty text, zero font
/// size, or a library without any faces.
pub(crate) fn shape_line(
    fonts: &mut FontLibrary,
    text: &str,
    style: &TextStyle,
) -> Option<ShapedLine> {
    let size = style.font_size();
    if text.is_empty() || size <= 0.0 {
        return None;
    }
    // cosmic-text panics when asked to shape without a fallback face
    if fonts.face_count() == 0 {
        log::debug!(target: "bitmap", "no font faces loaded, skipping text {:?}", text);
        return None;
    }

    let resolved = style
        .families()
        .find_map(|name| fonts.resolve_family(name))
        .unwrap_or(ResolvedFamily::SansSerif);
    let family = match &resolved {
        ResolvedFamily::SansSerif => Family::SansSerif,
        ResolvedFamily::Serif => Family::Serif,
        ResolvedFamily::Monospace => Family::Monospace,
        ResolvedFamily::Named(name) => Family::Name(name),
    };

    let mut attrs = Attrs::new()
        .family(family)
        .weight(if style.font_bold {
            Weight::BOLD
        } else {
            Weight::NORMAL
        })
        .style(if style.font_italic {
            Style::Italic
        } else {
            Style::Normal
        });
    if !fonts.hinting_enabled {
        attrs = attrs.cache_key_flags(CacheKeyFlags::DISABLE_HINTING);
    }

    let text = normalize_whitespace(text);
    let metrics = Metrics::new(size, size * LINE_HEIGHT_FACTOR);
    let mut buffer = Buffer::new(&mut fonts.font_system, metrics);
    buffer.set_text(&mut fonts.font_system, &text, &attrs, Shaping::Advanced, None);
    buffer.shape_until_scroll(&mut fonts.font_system, false);

    let width = buffer
        .layout_runs()
        .fold(0.0_f32, |width, run| width.max(run.line_w));

    Some(ShapedLine { buffer, width })
}

/// Advance width of `text` in pixels; 0 for empty text.
pub(crate) fn measure_width(fonts: &mut FontLibrary, text: &str, style: &TextStyle) -> f32 {
    shape_line(fonts, text, style).map_or(0.0, |line| line.width)
}

/// Vector outlines of every glyph of `line`, with the start of the line's
/// baseline placed at `(x, baseline)`.
pub(crate) fn glyph_paths(
    fonts: &mut FontLibrary,
    line: &ShapedLine,
    x: f32,
    baseline: f32,
) -> Vec<tiny_skia::Path> {
    let FontLibrary {
        font_system,
        swash_cache,
        ..
    } = fonts;

    let mut paths = Vec::new();
    for run in line.buffer.layout_runs() {
        for glyph in run.glyphs.iter() {
            let physical_glyph = glyph.physical((x, baseline), 1.0);

            let glyph_x = x + glyph.x + glyph.font_size * glyph.x_offset;
            let glyph_y = baseline + glyph.y - glyph.font_size * glyph.y_offset;

            let Some(commands) = swash_cache.get_outline_commands(font_system, physical_glyph.cache_key)
            else {
                continue;
            };

            // Font outlines have Y pointing up, the bitmap has Y pointing down
            let mut path_builder = tiny_skia::PathBuilder::new();
            for cmd in commands {
                match cmd {
                    Command::MoveTo(p) => path_builder.move_to(p.x, -p.y),
                    Command::LineTo(p) => path_builder.line_to(p.x, -p.y),
                    Command::QuadTo(ctrl, end) => {
                        path_builder.quad_to(ctrl.x, -ctrl.y, end.x, -end.y)
                    }
                    Command::CurveTo(c1, c2, end) => {
                        path_builder.cubic_to(c1.x, -c1.y, c2.x, -c2.y, end.x, -end.y)
                    }
                    Command::Close => path_builder.close(),
                }
            }

            if let Some(path) = path_builder
                .finish()
                .and_then(|path| path.transform(Transform::from_translate(glyph_x, glyph_y)))
            {
                paths.push(path);
            }
        }
    }
    paths
}
