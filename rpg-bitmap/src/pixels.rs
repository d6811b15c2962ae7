//! CPU-resident pixel storage.
//!
//! Pixels are stored as premultiplied RGBA8, the layout tiny-skia renders into.
//! Unlike `tiny_skia::Pixmap`, a `PixelBuffer` may have zero area.

/// Premultiplied RGBA8 pixel grid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
        }
    }

    /// Create a buffer from non-premultiplied RGBA data.
    ///
    /// Returns `None` if `data` does not hold exactly `width * height` pixels.
    pub fn from_straight_rgba(width: u32, height: u32, mut data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return None;
        }
        for px in data.chunks_exact_mut(4) {
            let [r, g, b, a] = premultiply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&[r, g, b, a]);
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Borrow the buffer as a tiny-skia render target. `None` for zero-area buffers.
    pub fn pixmap_mut(&mut self) -> Option<tiny_skia::PixmapMut<'_>> {
        tiny_skia::PixmapMut::from_bytes(&mut self.data, self.width, self.height)
    }

    /// Borrow the buffer as a tiny-skia image. `None` for zero-area buffers.
    pub fn pixmap_ref(&self) -> Option<tiny_skia::PixmapRef<'_>> {
        tiny_skia::PixmapRef::from_bytes(&self.data, self.width, self.height)
    }

    /// Set every pixel to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Set the pixels in `[x0, x1) x [y0, y1)` to transparent. Bounds must be valid.
    pub fn clear_region(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        let stride = self.width as usize * 4;
        for row in y0 as usize..y1 as usize {
            let start = row * stride + x0 as usize * 4;
            let end = row * stride + x1 as usize * 4;
            self.data[start..end].fill(0);
        }
    }

    /// Copy of the region `[x0, x1) x [y0, y1)`. Bounds must be valid.
    pub fn extract(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> PixelBuffer {
        let mut out = PixelBuffer::new(x1 - x0, y1 - y0);
        let src_stride = self.width as usize * 4;
        let dst_stride = out.width as usize * 4;
        for (i, row) in (y0 as usize..y1 as usize).enumerate() {
            let start = row * src_stride + x0 as usize * 4;
            out.data[i * dst_stride..(i + 1) * dst_stride]
                .copy_from_slice(&self.data[start..start + dst_stride]);
        }
        out
    }

    /// A `width x height` buffer holding the top-left overlap with this one.
    pub fn resized(&self, width: u32, height: u32) -> PixelBuffer {
        let mut out = PixelBuffer::new(width, height);
        let copy_w = self.width.min(width) as usize * 4;
        let copy_h = self.height.min(height) as usize;
        let src_stride = self.width as usize * 4;
        let dst_stride = width as usize * 4;
        for row in 0..copy_h {
            out.data[row * dst_stride..row * dst_stride + copy_w]
                .copy_from_slice(&self.data[row * src_stride..row * src_stride + copy_w]);
        }
        out
    }

    /// Composite `src` over this buffer with its top-left corner at `(dx, dy)`.
    ///
    /// Integer source-over blend in premultiplied space. Pixels falling outside
    /// this buffer are skipped.
    pub fn composite_over(&mut self, src: &PixelBuffer, dx: i64, dy: i64, opacity: u8) {
        let width = i64::from(self.width);
        let height = i64::from(self.height);
        for sy in 0..i64::from(src.height) {
            let ty = dy.saturating_add(sy);
            if ty < 0 || ty >= height {
                continue;
            }
            for sx in 0..i64::from(src.width) {
                let tx = dx.saturating_add(sx);
                if tx < 0 || tx >= width {
                    continue;
                }
                let si = ((sy * i64::from(src.width) + sx) * 4) as usize;
                let di = ((ty * width + tx) * 4) as usize;
                let s = scale_pixel(
                    [
                        src.data[si],
                        src.data[si + 1],
                        src.data[si + 2],
                        src.data[si + 3],
                    ],
                    opacity,
                );
                let d = &mut self.data[di..di + 4];
                let inv = 255 - u16::from(s[3]);
                for c in 0..4 {
                    d[c] = (u16::from(s[c]) + div255(u16::from(d[c]) * inv)).min(255) as u8;
                }
            }
        }
    }

    /// Straight (non-premultiplied) RGBA value at `(x, y)`, transparent black when out of bounds.
    pub fn straight_pixel(&self, x: i64, y: i64) -> [u8; 4] {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return [0, 0, 0, 0];
        }
        let idx = ((y * i64::from(self.width) + x) * 4) as usize;
        unpremultiply([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    /// The whole buffer as straight RGBA.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let [r, g, b, a] = unpremultiply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&[r, g, b, a]);
        }
        out
    }
}

/// `(x + 127) / 255` rounding division.
fn div255(x: u16) -> u16 {
    (x + 127) / 255
}

fn scale_pixel(px: [u8; 4], opacity: u8) -> [u8; 4] {
    if opacity == 255 {
        return px;
    }
    let o = u16::from(opacity);
    px.map(|c| div255(u16::from(c) * o) as u8)
}

fn premultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    match a {
        255 => [r, g, b, a],
        0 => [0, 0, 0, 0],
        _ => {
            let a16 = u16::from(a);
            [
                div255(u16::from(r) * a16) as u8,
                div255(u16::from(g) * a16) as u8,
                div255(u16::from(b) * a16) as u8,
                a,
            ]
        }
    }
}

fn unpremultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    match a {
        255 => [r, g, b, a],
        0 => [0, 0, 0, 0],
        _ => {
            let alpha_f = f32::from(a) / 255.0;
            [
                (f32::from(r) / alpha_f).round().min(255.0) as u8,
                (f32::from(g) / alpha_f).round().min(255.0) as u8,
                (f32::from(b) / alpha_f).round().min(255.0) as u8,
                a,
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: u32, height: u32, px: [u8; 4]) -> PixelBuffer {
        let data = px.repeat(width as usize * height as usize);
        PixelBuffer::from_straight_rgba(width, height, data).unwrap()
    }

    #[test]
    fn test_zero_area_buffer() {
        let mut buf = PixelBuffer::new(0, 7);
        assert!(buf.data().is_empty());
        assert!(buf.pixmap_mut().is_none());
        assert_eq!(buf.straight_pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_from_straight_rgba_rejects_wrong_length() {
        assert!(PixelBuffer::from_straight_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_premultiply_round_trip_opaque() {
        let buf = filled(3, 3, [10, 20, 30, 255]);
        assert_eq!(buf.straight_pixel(1, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn test_resized_keeps_overlap() {
        let buf = filled(4, 4, [255, 0, 0, 255]);
        let grown = buf.resized(6, 2);
        assert_eq!(grown.width(), 6);
        assert_eq!(grown.height(), 2);
        assert_eq!(grown.straight_pixel(3, 1), [255, 0, 0, 255]);
        assert_eq!(grown.straight_pixel(4, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn test_clear_region() {
        let mut buf = filled(4, 4, [0, 0, 255, 255]);
        buf.clear_region(1, 1, 3, 3);
        assert_eq!(buf.straight_pixel(0, 0), [0, 0, 255, 255]);
        assert_eq!(buf.straight_pixel(1, 1), [0, 0, 0, 0]);
        assert_eq!(buf.straight_pixel(2, 2), [0, 0, 0, 0]);
        assert_eq!(buf.straight_pixel(3, 3), [0, 0, 255, 255]);
    }

    #[test]
    fn test_composite_over_transparent_is_copy() {
        let src = filled(2, 2, [12, 34, 56, 200]);
        let mut dst = PixelBuffer::new(4, 4);
        dst.composite_over(&src, 1, 1, 255);
        assert_eq!(dst.extract(1, 1, 3, 3), src);
    }

    #[test]
    fn test_composite_over_clips_to_bounds() {
        let src = filled(3, 3, [255, 255, 255, 255]);
        let mut dst = PixelBuffer::new(2, 2);
        dst.composite_over(&src, -1, -1, 255);
        assert_eq!(dst.straight_pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(dst.straight_pixel(1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn test_composite_over_with_opacity() {
        let src = filled(1, 1, [255, 255, 255, 255]);
        let mut dst = PixelBuffer::new(1, 1);
        dst.composite_over(&src, 0, 0, 0);
        assert_eq!(dst.straight_pixel(0, 0), [0, 0, 0, 0]);
        dst.composite_over(&src, 0, 0, 128);
        assert_eq!(dst.straight_pixel(0, 0)[3], 128);
    }
}
