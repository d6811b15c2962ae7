//! Block transfer between bitmaps.

use super::Bitmap;
use crate::error::BitmapResult;
use crate::geometry::BltParams;
use crate::pixels::PixelBuffer;
use crate::style::ScaleMode;
use tiny_skia::Transform;

/// A source rectangle snapped to whole pixels and clamped to the source
/// bounds, with the matching destination rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BltRegion {
    sx0: u32,
    sy0: u32,
    sx1: u32,
    sy1: u32,
    dx: f32,
    dy: f32,
    dw: f32,
    dh: f32,
}

impl BltRegion {
    /// Whether the destination is a pixel-aligned, unscaled copy of the source.
    fn is_integer_copy(&self) -> bool {
        self.dw == (self.sx1 - self.sx0) as f32
            && self.dh == (self.sy1 - self.sy0) as f32
            && self.dx.fract() == 0.0
            && self.dy.fract() == 0.0
    }

    /// Whether the destination rectangle touches a `width x height` target.
    fn overlaps(&self, width: u32, height: u32) -> bool {
        self.dx < width as f32
            && self.dy < height as f32
            && self.dx + self.dw > 0.0
            && self.dy + self.dh > 0.0
    }
}

/// Clamp `params` against a `width x height` source.
///
/// Clamping the source shrinks the destination by the same proportion.
/// Returns `None` when nothing would be drawn.
fn clip_source(params: &BltParams, width: u32, height: u32) -> Option<BltRegion> {
    let dw = params.dest_width();
    let dh = params.dest_height();
    let finite = [params.sx, params.sy, params.sw, params.sh, params.dx, params.dy, dw, dh]
        .iter()
        .all(|v| v.is_finite());
    if !finite || params.sw <= 0.0 || params.sh <= 0.0 || dw <= 0.0 || dh <= 0.0 {
        return None;
    }
    let scale_x = dw / params.sw;
    let scale_y = dh / params.sh;

    let sx = params.sx.round();
    let sy = params.sy.round();
    let sx0 = sx.max(0.0);
    let sy0 = sy.max(0.0);
    let sx1 = (params.sx + params.sw).round().min(width as f32);
    let sy1 = (params.sy + params.sh).round().min(height as f32);
    if sx1 <= sx0 || sy1 <= sy0 {
        return None;
    }

    Some(BltRegion {
        sx0: sx0 as u32,
        sy0: sy0 as u32,
        sx1: sx1 as u32,
        sy1: sy1 as u32,
        dx: params.dx + (sx0 - sx) * scale_x,
        dy: params.dy + (sy0 - sy) * scale_y,
        dw: (sx1 - sx0) * scale_x,
        dh: (sy1 - sy0) * scale_y,
    })
}

impl Bitmap {
    /// Copy a region of `source` into this bitmap, scaling it when the
    /// destination size differs from the source size.
    pub fn blt(&mut self, source: &Bitmap, params: &BltParams) -> BitmapResult<()> {
        self.ensure_ready()?;
        source.ensure_ready()?;
        log::debug!(target: "bitmap", "blt {:?} from {:?}", params, source.url());
        self.blt_from_buffer(&source.buffer, params);
        Ok(())
    }

    /// Copy a region of this bitmap onto itself.
    ///
    /// The source region is read before anything is written, so overlapping
    /// rectangles behave as if copied from a snapshot.
    pub fn blt_self(&mut self, params: &BltParams) -> BitmapResult<()> {
        self.ensure_ready()?;
        log::debug!(target: "bitmap", "blt {:?} from self", params);
        let snapshot = self.buffer.clone();
        self.blt_from_buffer(&snapshot, params);
        Ok(())
    }

    /// Unscaled copy of `(sx, sy, sw, sh)` from `source` to `(dx, dy)`.
    #[allow(clippy::too_many_arguments)]
    pub fn blt_simple(
        &mut self,
        source: &Bitmap,
        sx: f32,
        sy: f32,
        sw: f32,
        sh: f32,
        dx: f32,
        dy: f32,
    ) -> BitmapResult<()> {
        self.blt(source, &BltParams::new(sx, sy, sw, sh, dx, dy))
    }

    fn blt_from_buffer(&mut self, source: &PixelBuffer, params: &BltParams) {
        let Some(region) = clip_source(params, source.width(), source.height()) else {
            return;
        };
        if !region.overlaps(self.buffer.width(), self.buffer.height()) {
            return;
        }
        let pixels = source.extract(region.sx0, region.sy0, region.sx1, region.sy1);

        if region.is_integer_copy() {
            self.buffer.composite_over(
                &pixels,
                region.dx as i64,
                region.dy as i64,
                self.paint_opacity,
            );
            self.mark_dirty();
            return;
        }

        let Some(image) = pixels.pixmap_ref() else {
            return;
        };
        let paint = tiny_skia::PixmapPaint {
            opacity: f32::from(self.paint_opacity) / 255.0,
            blend_mode: tiny_skia::BlendMode::SourceOver,
            quality: ScaleMode::from_smooth(self.smooth).into(),
        };
        let transform = Transform::from_translate(region.dx, region.dy).pre_scale(
            region.dw / pixels.width() as f32,
            region.dh / pixels.height() as f32,
        );
        self.render(|pixmap| pixmap.draw_pixmap(0, 0, image, &paint, transform, None));
    }
}
