//! Text drawing and measurement for Bitmap.

use super::Bitmap;
use crate::color::{parse_color, with_opacity};
use crate::error::BitmapResult;
use crate::style::TextAlign;
use crate::text::{glyph_paths, measure_width, shape_line};
use std::rc::Rc;
use tiny_skia::Transform;

/// Distance from the vertical center of the line box to the baseline, in font sizes.
const BASELINE_FACTOR: f32 = 0.35;

/// Smallest horizontal scale text is still drawn at when squeezed into `max_width`.
const MIN_TEXT_SCALE: f32 = 0.001;

impl Bitmap {
    /// Draw a single line of text.
    ///
    /// The text is vertically centered in a box of `line_height` starting at `y`
    /// and aligned inside `x..x + max_width`. Text wider than `max_width` is
    /// squeezed horizontally to fit. The outline is drawn first at full opacity,
    /// then the body with the paint opacity applied.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        max_width: Option<f32>,
        line_height: f32,
        align: TextAlign,
    ) -> BitmapResult<()> {
        self.ensure_ready()?;
        log::debug!(target: "bitmap", "drawText \"{}\" {} {} {:?} {} {:?}", text, x, y, max_width, line_height, align);

        if let Some(mw) = max_width {
            if mw <= 0.0 || mw.is_nan() {
                return Ok(());
            }
        }
        let body_color = with_opacity(parse_color(&self.style.text_color)?, self.paint_opacity);
        let outline_color = parse_color(&self.style.outline_color)?;
        let outline_width = self.style.outline_width();

        let shared = Rc::clone(&self.fonts);
        let mut fonts = shared.borrow_mut();
        let Some(line) = shape_line(&mut fonts, text, &self.style) else {
            return Ok(());
        };

        let scale_x = match max_width {
            Some(mw) if mw.is_finite() && line.width > mw => mw / line.width,
            _ => 1.0,
        };
        if scale_x < MIN_TEXT_SCALE {
            return Ok(());
        }

        let width = max_width.filter(|mw| mw.is_finite()).unwrap_or(0.0);
        let (anchor, offset) = match align {
            TextAlign::Left => (x, 0.0),
            TextAlign::Center => (x + width / 2.0, -line.width / 2.0),
            TextAlign::Right => (x + width, -line.width),
        };
        let baseline = (y + line_height / 2.0 + self.style.font_size() * BASELINE_FACTOR).round();

        // Glyphs are laid out at the origin, then offset for alignment and
        // squeezed around the anchor
        let transform = Transform::from_translate(anchor, baseline)
            .pre_scale(scale_x, 1.0)
            .pre_translate(offset, 0.0);
        let paths = glyph_paths(&mut fonts, &line, 0.0, 0.0);
        drop(fonts);

        let mut outline_paint = tiny_skia::Paint {
            anti_alias: true,
            ..Default::default()
        };
        outline_paint.set_color(outline_color);
        let stroke = tiny_skia::Stroke {
            width: outline_width,
            line_join: tiny_skia::LineJoin::Round,
            ..Default::default()
        };
        let mut body_paint = tiny_skia::Paint {
            anti_alias: true,
            ..Default::default()
        };
        body_paint.set_color(body_color);

        self.render(|pixmap| {
            if outline_width > 0.0 {
                for path in &paths {
                    pixmap.stroke_path(path, &outline_paint, &stroke, transform, None);
                }
            }
            for path in &paths {
                pixmap.fill_path(
                    path,
                    &body_paint,
                    tiny_skia::FillRule::Winding,
                    transform,
                    None,
                );
            }
        });
        Ok(())
    }

    /// Width of `text` in pixels with the current font settings.
    ///
    /// Matches the width `draw_text` lays the text out with before any
    /// `max_width` squeezing.
    pub fn measure_text_width(&self, text: &str) -> BitmapResult<f32> {
        self.ensure_alive()?;
        let mut fonts = self.fonts.borrow_mut();
        Ok(measure_width(&mut fonts, text, &self.style))
    }
}

#[cfg(test)]
mod tests {
    use crate::bitmap::Bitmap;
    use crate::error::BitmapError;
    use crate::font_config::{FontConfig, FontLibrary};
    use crate::style::TextAlign;

    fn bitmap_without_fonts(width: i32, height: i32) -> Bitmap {
        Bitmap::with_fonts(width, height, FontConfig::empty().resolve().into_shared()).unwrap()
    }

    fn drawn_columns(bitmap: &Bitmap) -> Vec<i32> {
        (0..bitmap.width() as i32)
            .filter(|&x| {
                (0..bitmap.height() as i32).any(|y| bitmap.get_alpha_pixel(x, y).unwrap() > 0)
            })
            .collect()
    }

    #[test]
    fn test_measure_empty_text() {
        let bitmap = bitmap_without_fonts(1, 1);
        assert_eq!(bitmap.measure_text_width("").unwrap(), 0.0);
    }

    #[test]
    fn test_draw_text_requires_ready() {
        let mut bitmap = Bitmap::empty_with_fonts(FontConfig::empty().resolve().into_shared());
        assert!(matches!(
            bitmap.draw_text("Hi", 0.0, 0.0, None, 24.0, TextAlign::Left),
            Err(BitmapError::NotReady { .. })
        ));
    }

    #[test]
    fn test_draw_text_invalid_color() {
        let mut bitmap = bitmap_without_fonts(16, 16);
        bitmap.text_style_mut().text_color = "nope".to_string();
        assert!(matches!(
            bitmap.draw_text("Hi", 0.0, 0.0, None, 16.0, TextAlign::Left),
            Err(BitmapError::ColorParse(_))
        ));
    }

    #[test]
    fn test_draw_text_zero_max_width_draws_nothing() {
        let mut bitmap = Bitmap::with_fonts(64, 32, FontLibrary::thread_default()).unwrap();
        bitmap
            .draw_text("Hello", 0.0, 0.0, Some(0.0), 32.0, TextAlign::Left)
            .unwrap();
        assert!(drawn_columns(&bitmap).is_empty());
    }

    #[test]
    fn test_draw_text_alignment() {
        let fonts = FontLibrary::thread_default();
        if fonts.borrow().face_count() == 0 {
            // No system fonts to draw with
            return;
        }

        let mut left = Bitmap::with_fonts(200, 40, fonts.clone()).unwrap();
        left.set_outline_width(0.0);
        left.draw_text("Gold", 0.0, 0.0, Some(200.0), 40.0, TextAlign::Left)
            .unwrap();
        let mut right = Bitmap::with_fonts(200, 40, fonts).unwrap();
        right.set_outline_width(0.0);
        right
            .draw_text("Gold", 0.0, 0.0, Some(200.0), 40.0, TextAlign::Right)
            .unwrap();

        let left_cols = drawn_columns(&left);
        let right_cols = drawn_columns(&right);
        assert!(!left_cols.is_empty());
        assert!(left_cols[0] < 10);
        assert!(*right_cols.last().unwrap() > 189);
    }

    #[test]
    fn test_draw_text_squeezes_to_max_width() {
        let fonts = FontLibrary::thread_default();
        if fonts.borrow().face_count() == 0 {
            return;
        }

        let mut bitmap = Bitmap::with_fonts(300, 40, fonts).unwrap();
        bitmap.set_outline_width(0.0);
        let text = "A very long item description";
        assert!(bitmap.measure_text_width(text).unwrap() > 50.0);
        bitmap
            .draw_text(text, 10.0, 0.0, Some(50.0), 40.0, TextAlign::Left)
            .unwrap();
        let cols = drawn_columns(&bitmap);
        assert!(*cols.first().unwrap() >= 9);
        assert!(*cols.last().unwrap() <= 61);
    }
}
