//! Snapshots of render sources and PNG export.

use super::Bitmap;
use crate::error::{BitmapError, BitmapResult};
use crate::font_config::{FontLibrary, SharedFonts};
use crate::geometry::BltParams;

/// Something that can draw itself into a bitmap, such as a stage or a window layer.
pub trait RenderSource {
    /// Size in pixels of the image this source renders.
    fn output_size(&self) -> (u32, u32);

    /// Draw the current frame into `target`, which is sized to `output_size`.
    fn render_to(&self, target: &mut Bitmap) -> BitmapResult<()>;
}

impl RenderSource for Bitmap {
    fn output_size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn render_to(&self, target: &mut Bitmap) -> BitmapResult<()> {
        let (width, height) = (self.width() as f32, self.height() as f32);
        target.blt(self, &BltParams::new(0.0, 0.0, width, height, 0.0, 0.0))
    }
}

impl Bitmap {
    /// Capture the current frame of `source` into a new bitmap.
    pub fn snap(source: &dyn RenderSource) -> BitmapResult<Bitmap> {
        Self::snap_with_fonts(source, FontLibrary::thread_default())
    }

    /// Capture `source` into a new bitmap that draws text with `fonts`.
    pub fn snap_with_fonts(source: &dyn RenderSource, fonts: SharedFonts) -> BitmapResult<Bitmap> {
        let (w, h) = source.output_size();
        let invalid = |_| BitmapError::InvalidDimension {
            width: i64::from(w),
            height: i64::from(h),
        };
        let width = i32::try_from(w).map_err(invalid)?;
        let height = i32::try_from(h).map_err(invalid)?;
        log::debug!(target: "bitmap", "snap {}x{}", width, height);
        let mut bitmap = Bitmap::with_fonts(width, height, fonts)?;
        source.render_to(&mut bitmap)?;
        Ok(bitmap)
    }

    /// Export the bitmap as PNG data.
    ///
    /// # Arguments
    /// * `ppi` - Optional pixels per inch for PNG metadata. Defaults to 72 if not specified.
    pub fn to_png(&self, ppi: Option<f32>) -> BitmapResult<Vec<u8>> {
        self.ensure_ready()?;
        if self.width() == 0 || self.height() == 0 {
            return Err(BitmapError::InvalidDimension {
                width: i64::from(self.width()),
                height: i64::from(self.height()),
            });
        }
        let ppi = ppi.unwrap_or(72.0);

        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width(), self.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            // Pixel density metadata is stored per meter
            let ppm = (ppi.max(0.0) / 0.0254).round() as u32;
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: ppm,
                yppu: ppm,
                unit: png::Unit::Meter,
            }));

            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.buffer.to_straight_rgba())?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_config::FontConfig;

    fn fonts() -> SharedFonts {
        FontConfig::empty().resolve().into_shared()
    }

    /// Two bitmaps composed side by side.
    struct Strip {
        left: Bitmap,
        right: Bitmap,
    }

    impl RenderSource for Strip {
        fn output_size(&self) -> (u32, u32) {
            (self.left.width() + self.right.width(), self.left.height())
        }

        fn render_to(&self, target: &mut Bitmap) -> BitmapResult<()> {
            let (w, h) = (self.left.width() as f32, self.left.height() as f32);
            target.blt_simple(&self.left, 0.0, 0.0, w, h, 0.0, 0.0)?;
            target.blt_simple(&self.right, 0.0, 0.0, w, h, w, 0.0)
        }
    }

    #[test]
    fn test_snap_render_source() {
        let mut left = Bitmap::with_fonts(2, 2, fonts()).unwrap();
        left.fill_all("#ff0000").unwrap();
        let mut right = Bitmap::with_fonts(2, 2, fonts()).unwrap();
        right.fill_all("#0000ff").unwrap();

        let snap = Bitmap::snap_with_fonts(&Strip { left, right }, fonts()).unwrap();
        assert!(snap.is_ready());
        assert_eq!((snap.width(), snap.height()), (4, 2));
        assert_eq!(snap.get_pixel(1, 1).unwrap(), "#ff0000");
        assert_eq!(snap.get_pixel(2, 0).unwrap(), "#0000ff");
    }

    #[test]
    fn test_snap_bitmap() {
        let mut source = Bitmap::with_fonts(3, 3, fonts()).unwrap();
        source.fill_rect(1.0, 1.0, 1.0, 1.0, "#00ff00").unwrap();
        let copy = Bitmap::snap_with_fonts(&source, fonts()).unwrap();
        assert_eq!(copy.get_pixel(1, 1).unwrap(), "#00ff00");
        assert_eq!(copy.get_alpha_pixel(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_png_round_trip() {
        let mut bitmap = Bitmap::with_fonts(5, 3, fonts()).unwrap();
        bitmap.fill_rect(0.0, 0.0, 2.0, 3.0, "#336699").unwrap();
        let png = bitmap.to_png(None).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = Bitmap::from_encoded(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
        assert_eq!(decoded.get_pixel(1, 2).unwrap(), "#336699");
        assert_eq!(decoded.get_alpha_pixel(4, 0).unwrap(), 0);
    }

    #[test]
    fn test_to_png_zero_size() {
        let bitmap = Bitmap::with_fonts(0, 4, fonts()).unwrap();
        assert!(matches!(
            bitmap.to_png(None),
            Err(BitmapError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_from_encoded_garbage() {
        assert!(matches!(
            Bitmap::from_encoded(b"definitely not a png"),
            Err(BitmapError::LoadFailure(_))
        ));
    }
}
