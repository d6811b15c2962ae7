//! Parameter structs for bitmap operations.
//!
//! These structs replace long positional argument lists with named fields,
//! grouping semantically related parameters together.

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// X coordinate of the upper-left corner.
    pub x: f32,
    /// Y coordinate of the upper-left corner.
    pub y: f32,
    /// Width of the rectangle.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The same rectangle with negative width/height flipped to positive.
    pub fn normalized(self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self::new(x, y, width, height)
    }

    /// Whether the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Snap the rectangle to whole pixels and intersect it with `0..width x 0..height`.
    ///
    /// Returns `(x0, y0, x1, y1)` with `x0 < x1` and `y0 < y1`, or `None` when the
    /// intersection is empty.
    pub(crate) fn pixel_bounds(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if !(self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite())
        {
            return None;
        }
        let x0 = self.x.round().max(0.0);
        let y0 = self.y.round().max(0.0);
        let x1 = (self.x + self.width).round().min(width as f32);
        let y1 = (self.y + self.height).round().min(height as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    pub(crate) fn to_skia(self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_xywh(self.x, self.y, self.width, self.height)
    }
}

/// Parameters for a block transfer from one bitmap into another.
///
/// `dw`/`dh` default to `sw`/`sh` when `None`, i.e. an unscaled copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BltParams {
    /// Source x coordinate.
    pub sx: f32,
    /// Source y coordinate.
    pub sy: f32,
    /// Source width.
    pub sw: f32,
    /// Source height.
    pub sh: f32,
    /// Destination x coordinate.
    pub dx: f32,
    /// Destination y coordinate.
    pub dy: f32,
    /// Destination width (defaults to `sw`).
    pub dw: Option<f32>,
    /// Destination height (defaults to `sh`).
    pub dh: Option<f32>,
}

impl BltParams {
    /// An unscaled copy of `(sx, sy, sw, sh)` to `(dx, dy)`.
    pub fn new(sx: f32, sy: f32, sw: f32, sh: f32, dx: f32, dy: f32) -> Self {
        Self {
            sx,
            sy,
            sw,
            sh,
            dx,
            dy,
            dw: None,
            dh: None,
        }
    }

    /// Scale the copy into a `dw x dh` destination rectangle.
    pub fn scaled_to(mut self, dw: f32, dh: f32) -> Self {
        self.dw = Some(dw);
        self.dh = Some(dh);
        self
    }

    /// Destination width after applying the default.
    pub fn dest_width(&self) -> f32 {
        self.dw.unwrap_or(self.sw)
    }

    /// Destination height after applying the default.
    pub fn dest_height(&self) -> f32 {
        self.dh.unwrap_or(self.sh)
    }
}
