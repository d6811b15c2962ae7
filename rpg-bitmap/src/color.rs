//! CSS color parsing and hex formatting.

use crate::error::{BitmapError, BitmapResult};

/// Parse a CSS color string (`#rgb`, `#rrggbb`, `rgba(...)`, named colors) into a
/// tiny_skia::Color.
pub fn parse_color(s: &str) -> BitmapResult<tiny_skia::Color> {
    let parsed = csscolorparser::parse(s)
        .map_err(|e| BitmapError::ColorParse(format!("{}: {}", s, e)))?;

    let [r, g, b, a] = parsed.to_array();
    Ok(tiny_skia::Color::from_rgba(r, g, b, a).unwrap_or(tiny_skia::Color::BLACK))
}

/// Format straight RGB channels as a lowercase `#rrggbb` string.
pub fn to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Scale a color's alpha by a paint opacity in the 0-255 range.
pub(crate) fn with_opacity(mut color: tiny_skia::Color, opacity: u8) -> tiny_skia::Color {
    if opacity < 255 {
        color.set_alpha((color.alpha() * f32::from(opacity) / 255.0).clamp(0.0, 1.0));
    }
    color
}
