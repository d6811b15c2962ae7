//! Style types for bitmap drawing.

use crate::error::BitmapError;

/// Horizontal text alignment within the `max_width` box of `draw_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    /// Text starts at `x`.
    #[default]
    Left,
    /// Text is centered in `[x, x + max_width]`.
    Center,
    /// Text ends at `x + max_width`.
    Right,
}

impl std::str::FromStr for TextAlign {
    type Err = BitmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" | "" => Ok(TextAlign::Left),
            "center" => Ok(TextAlign::Center),
            "right" => Ok(TextAlign::Right),
            _ => Err(BitmapError::InvalidArgument(format!(
                "Invalid text alignment: '{}'",
                s
            ))),
        }
    }
}

/// Sampling used when a bitmap is drawn scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Bilinear filtering.
    #[default]
    Linear,
    /// Nearest-neighbor sampling.
    Nearest,
}

impl ScaleMode {
    pub fn from_smooth(smooth: bool) -> Self {
        if smooth {
            ScaleMode::Linear
        } else {
            ScaleMode::Nearest
        }
    }
}

impl From<ScaleMode> for tiny_skia::FilterQuality {
    fn from(mode: ScaleMode) -> Self {
        match mode {
            ScaleMode::Linear => tiny_skia::FilterQuality::Bilinear,
            ScaleMode::Nearest => tiny_skia::FilterQuality::Nearest,
        }
    }
}

/// Font and color attributes used by `draw_text` and `measure_text_width`.
///
/// Changing an attribute only affects text drawn afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Comma separated font family list, e.g. `"Verdana, sans-serif"`.
    pub font_face: String,
    /// Whether the font is bold.
    pub font_bold: bool,
    /// Whether the font is italic.
    pub font_italic: bool,
    /// Fill color of the text in CSS format.
    pub text_color: String,
    /// Color of the text outline in CSS format.
    pub outline_color: String,
    font_size: f32,
    outline_width: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_face: "sans-serif".to_string(),
            font_bold: false,
            font_italic: false,
            text_color: "#ffffff".to_string(),
            outline_color: "rgba(0, 0, 0, 0.5)".to_string(),
            font_size: 16.0,
            outline_width: 3.0,
        }
    }
}

impl TextStyle {
    /// Font size in pixels.
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Set the font size in pixels.
    /// Ignores non-finite or negative values. Returns true if the value was accepted.
    pub fn set_font_size(&mut self, size: f32) -> bool {
        if size.is_finite() && size >= 0.0 {
            self.font_size = size;
            true
        } else {
            log::warn!(target: "bitmap", "ignoring invalid font size {}", size);
            false
        }
    }

    /// Width of the text outline in pixels.
    pub fn outline_width(&self) -> f32 {
        self.outline_width
    }

    /// Set the outline width in pixels. Zero disables the outline.
    /// Ignores non-finite or negative values. Returns true if the value was accepted.
    pub fn set_outline_width(&mut self, width: f32) -> bool {
        if width.is_finite() && width >= 0.0 {
            self.outline_width = width;
            true
        } else {
            log::warn!(target: "bitmap", "ignoring invalid outline width {}", width);
            false
        }
    }

    /// The CSS font shorthand for this style, e.g. `"Italic Bold 16px sans-serif"`.
    pub fn font_name_text(&self) -> String {
        format!(
            "{}{}{}px {}",
            if self.font_italic { "Italic " } else { "" },
            if self.font_bold { "Bold " } else { "" },
            self.font_size,
            self.font_face
        )
    }

    /// Individual family names from `font_face`, unquoted and trimmed.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.font_face
            .split(',')
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|f| !f.is_empty())
    }
}
