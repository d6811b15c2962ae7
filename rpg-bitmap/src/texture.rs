//! Presentation-side texture kept in sync with a bitmap's pixel buffer.

use crate::pixels::PixelBuffer;
use crate::style::ScaleMode;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generating unique texture IDs.
static TEXTURE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The drawable handle of a bitmap.
///
/// Holds the straight-alpha RGBA upload of the bitmap's pixels, as a renderer
/// would receive them. The owning [`Bitmap`](crate::Bitmap) re-uploads before
/// handing the texture out, so a texture obtained through the bitmap always
/// matches its pixels.
#[derive(Debug, Clone)]
pub struct BaseTexture {
    id: u64,
    width: u32,
    height: u32,
    scale_mode: ScaleMode,
    version: u64,
    pixels: Vec<u8>,
}

impl BaseTexture {
    pub(crate) fn new(scale_mode: ScaleMode) -> Self {
        Self {
            id: TEXTURE_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            width: 0,
            height: 0,
            scale_mode,
            version: 0,
            pixels: Vec::new(),
        }
    }

    /// Copy the buffer contents into the texture and bump its version.
    pub(crate) fn upload(&mut self, buffer: &PixelBuffer) {
        self.width = buffer.width();
        self.height = buffer.height();
        self.pixels = buffer.to_straight_rgba();
        self.version += 1;
        log::trace!(target: "bitmap", "texture {} upload v{} {}x{}", self.id, self.version, self.width, self.height);
    }

    pub(crate) fn set_scale_mode(&mut self, scale_mode: ScaleMode) {
        self.scale_mode = scale_mode;
    }

    /// Unique identifier of this texture.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sampling mode a renderer should use when scaling this texture.
    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    /// Number of uploads so far. Changes whenever the pixels change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Straight-alpha RGBA pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = BaseTexture::new(ScaleMode::Linear);
        let b = BaseTexture::new(ScaleMode::Linear);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_upload_bumps_version() {
        let mut texture = BaseTexture::new(ScaleMode::Nearest);
        let buffer = PixelBuffer::new(3, 2);
        texture.upload(&buffer);
        assert_eq!(texture.version(), 1);
        assert_eq!((texture.width(), texture.height()), (3, 2));
        assert_eq!(texture.pixels().len(), 3 * 2 * 4);
        texture.upload(&buffer);
        assert_eq!(texture.version(), 2);
    }
}
