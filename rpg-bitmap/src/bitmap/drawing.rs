//! Fill, stroke and clear operations plus pixel queries.

use super::Bitmap;
use crate::color::{parse_color, to_hex, with_opacity};
use crate::error::BitmapResult;
use crate::geometry::Rect;
use tiny_skia::Transform;

/// Width of the line drawn by `stroke_rect`.
const STROKE_WIDTH: f32 = 1.0;

impl Bitmap {
    // --- Clearing ---

    /// Clear the entire bitmap to transparent.
    pub fn clear(&mut self) -> BitmapResult<()> {
        self.ensure_ready()?;
        log::debug!(target: "bitmap", "clear");
        self.buffer.clear();
        self.mark_dirty();
        Ok(())
    }

    /// Clear the specified rectangle to transparent. Paint opacity does not apply.
    pub fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> BitmapResult<()> {
        self.ensure_ready()?;
        log::debug!(target: "bitmap", "clearRect {} {} {} {}", x, y, width, height);
        let rect = Rect::new(x, y, width, height).normalized();
        if let Some((x0, y0, x1, y1)) = rect.pixel_bounds(self.width(), self.height()) {
            self.buffer.clear_region(x0, y0, x1, y1);
            self.mark_dirty();
        }
        Ok(())
    }

    // --- Fills ---

    /// Fill a rectangle with a CSS color.
    pub fn fill_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: &str,
    ) -> BitmapResult<()> {
        self.ensure_ready()?;
        log::debug!(target: "bitmap", "fillRect {} {} {} {} {}", x, y, width, height, color);
        let paint = self.solid_paint(color)?;
        let Some(rect) = Rect::new(x, y, width, height).normalized().to_skia() else {
            return Ok(());
        };
        self.render(|pixmap| pixmap.fill_rect(rect, &paint, Transform::identity(), None));
        Ok(())
    }

    /// Fill the entire bitmap with a CSS color.
    pub fn fill_all(&mut self, color: &str) -> BitmapResult<()> {
        let Rect { width, height, .. } = self.rect();
        self.fill_rect(0.0, 0.0, width, height, color)
    }

    /// Draw a one pixel wide rectangle outline, centered on the rectangle's edges.
    pub fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: &str,
    ) -> BitmapResult<()> {
        self.ensure_ready()?;
        log::debug!(target: "bitmap", "strokeRect {} {} {} {} {}", x, y, width, height, color);
        let paint = self.solid_paint(color)?;
        let Some(path) = Rect::new(x, y, width, height)
            .normalized()
            .to_skia()
            .map(tiny_skia::PathBuilder::from_rect)
        else {
            return Ok(());
        };
        let stroke = tiny_skia::Stroke {
            width: STROKE_WIDTH,
            line_join: tiny_skia::LineJoin::Miter,
            ..Default::default()
        };
        self.render(|pixmap| {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None)
        });
        Ok(())
    }

    /// Fill a rectangle with a linear gradient from `color1` to `color2`.
    ///
    /// The gradient runs top to bottom when `vertical` is set, left to right otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn gradient_fill_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color1: &str,
        color2: &str,
        vertical: bool,
    ) -> BitmapResult<()> {
        self.ensure_ready()?;
        log::debug!(
            target: "bitmap",
            "gradientFillRect {} {} {} {} {} {} {}",
            x, y, width, height, color1, color2, vertical
        );
        let start = with_opacity(parse_color(color1)?, self.paint_opacity);
        let end = with_opacity(parse_color(color2)?, self.paint_opacity);

        let rect = Rect::new(x, y, width, height).normalized();
        let Some(skia_rect) = rect.to_skia() else {
            return Ok(());
        };
        let (x1, y1) = if vertical {
            (rect.x, rect.y + rect.height)
        } else {
            (rect.x + rect.width, rect.y)
        };
        let Some(shader) = tiny_skia::LinearGradient::new(
            tiny_skia::Point { x: rect.x, y: rect.y },
            tiny_skia::Point { x: x1, y: y1 },
            vec![
                tiny_skia::GradientStop::new(0.0, start),
                tiny_skia::GradientStop::new(1.0, end),
            ],
            tiny_skia::SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return Ok(());
        };

        let paint = tiny_skia::Paint {
            shader,
            anti_alias: true,
            ..Default::default()
        };
        self.render(|pixmap| pixmap.fill_rect(skia_rect, &paint, Transform::identity(), None));
        Ok(())
    }

    /// Fill a circle centered at `(x, y)`.
    pub fn draw_circle(&mut self, x: f32, y: f32, radius: f32, color: &str) -> BitmapResult<()> {
        self.ensure_ready()?;
        log::debug!(target: "bitmap", "drawCircle {} {} {} {}", x, y, radius, color);
        let paint = self.solid_paint(color)?;
        let Some(path) = tiny_skia::PathBuilder::from_circle(x, y, radius) else {
            return Ok(());
        };
        self.render(|pixmap| {
            pixmap.fill_path(
                &path,
                &paint,
                tiny_skia::FillRule::Winding,
                Transform::identity(),
                None,
            )
        });
        Ok(())
    }

    // --- Pixel queries ---

    /// The color of the pixel at `(x, y)` as `#rrggbb`.
    ///
    /// Out-of-bounds coordinates return `#000000`.
    pub fn get_pixel(&self, x: i32, y: i32) -> BitmapResult<String> {
        self.ensure_ready()?;
        let [r, g, b, _] = self.buffer.straight_pixel(i64::from(x), i64::from(y));
        Ok(to_hex(r, g, b))
    }

    /// The alpha value of the pixel at `(x, y)`. Out-of-bounds coordinates return 0.
    pub fn get_alpha_pixel(&self, x: i32, y: i32) -> BitmapResult<u8> {
        self.ensure_ready()?;
        Ok(self.buffer.straight_pixel(i64::from(x), i64::from(y))[3])
    }

    // --- Private paint helpers ---

    /// A solid paint of `color` with the paint opacity applied.
    fn solid_paint(&self, color: &str) -> BitmapResult<tiny_skia::Paint<'static>> {
        let color = with_opacity(parse_color(color)?, self.paint_opacity);
        let mut paint = tiny_skia::Paint {
            anti_alias: true,
            ..Default::default()
        };
        paint.set_color(color);
        Ok(paint)
    }
}
