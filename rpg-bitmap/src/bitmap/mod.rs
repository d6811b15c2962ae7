//! The bitmap: a managed raster surface with lazy image loading.

mod blit;
mod drawing;
mod snapshot;
mod text_rendering;

pub use snapshot::RenderSource;

use crate::error::{BitmapError, BitmapResult, LoadError};
use crate::font_config::{FontLibrary, SharedFonts};
use crate::geometry::Rect;
use crate::loader::{decode_image, AssetLoader, LoadOutcome, PendingLoad};
use crate::pixels::PixelBuffer;
use crate::style::{ScaleMode, TextStyle};
use crate::texture::BaseTexture;
use std::collections::VecDeque;

/// Maximum bitmap dimension (same as Chrome's canvas limit).
pub const MAX_DIMENSION: u32 = 32767;

/// Loading state of a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Created without pixels, waiting for `load_url` or `resize`.
    Empty,
    /// An image fetch is in flight.
    Loading,
    /// Pixels are valid and can be drawn and read.
    Ready,
    /// The last image fetch failed; see [`Bitmap::load_error`].
    Error,
}

/// Callback run once when a pending load resolves.
pub type LoadListener = Box<dyn FnOnce(&Bitmap)>;

/// A 2D raster surface.
///
/// A bitmap is either drawn procedurally (`Bitmap::new`) or populated from an
/// image (`Bitmap::load`). Loading is asynchronous: the bitmap stays
/// [`LoadState::Loading`] until its owner calls [`poll_load`](Bitmap::poll_load)
/// (once per frame) or [`wait_for_load`](Bitmap::wait_for_load) after the
/// image arrived.
pub struct Bitmap {
    /// CPU-side pixels, premultiplied RGBA.
    pub(crate) buffer: PixelBuffer,
    /// Drawable handle; `None` once destroyed.
    texture: Option<BaseTexture>,
    /// Whether `buffer` changed since the last texture upload.
    texture_dirty: bool,
    /// Fonts used for text drawing and measurement.
    pub(crate) fonts: SharedFonts,
    /// Font and color attributes for text.
    pub(crate) style: TextStyle,
    /// Opacity applied to fills, blits and text bodies.
    pub(crate) paint_opacity: u8,
    /// Bilinear (true) or nearest-neighbor (false) scaling.
    pub(crate) smooth: bool,
    url: Option<String>,
    state: LoadState,
    loader: Option<AssetLoader>,
    pending: Option<PendingLoad>,
    load_error: Option<LoadError>,
    listeners: VecDeque<LoadListener>,
    destroyed: bool,
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.buffer.width())
            .field("height", &self.buffer.height())
            .field("url", &self.url)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl Bitmap {
    /// Create a transparent bitmap of the given size, ready to draw on.
    ///
    /// Uses the thread's default font library (system fonts).
    pub fn new(width: i32, height: i32) -> BitmapResult<Self> {
        Self::with_fonts(width, height, FontLibrary::thread_default())
    }

    /// Create a transparent bitmap that draws text with `fonts`.
    pub fn with_fonts(width: i32, height: i32, fonts: SharedFonts) -> BitmapResult<Self> {
        let (width, height) = validate_dimensions(i64::from(width), i64::from(height))?;
        let mut bitmap = Self::blank(fonts);
        bitmap.buffer = PixelBuffer::new(width, height);
        bitmap.state = LoadState::Ready;
        log::debug!(target: "bitmap", "new {}x{}", width, height);
        Ok(bitmap)
    }

    /// Create an empty bitmap with no pixels, to be populated by `load_url` or `resize`.
    pub fn empty() -> Self {
        Self::blank(FontLibrary::thread_default())
    }

    /// Create an empty bitmap that draws text with `fonts`.
    pub fn empty_with_fonts(fonts: SharedFonts) -> Self {
        Self::blank(fonts)
    }

    /// Start loading `url` into a new bitmap. Returns immediately in the `Loading` state.
    pub fn load(loader: &AssetLoader, url: &str) -> Self {
        let mut bitmap = Self::empty();
        bitmap.start_load(loader.clone(), url.to_string());
        bitmap
    }

    /// Decode an in-memory PNG or JPEG into a ready bitmap.
    pub fn from_encoded(bytes: &[u8]) -> BitmapResult<Self> {
        let decoded = decode_image("<memory>", bytes, MAX_DIMENSION)?;
        let mut bitmap = Self::empty();
        bitmap.buffer = decoded.pixels;
        bitmap.state = LoadState::Ready;
        Ok(bitmap)
    }

    fn blank(fonts: SharedFonts) -> Self {
        let smooth = true;
        Self {
            buffer: PixelBuffer::default(),
            texture: Some(BaseTexture::new(ScaleMode::from_smooth(smooth))),
            texture_dirty: true,
            fonts,
            style: TextStyle::default(),
            paint_opacity: 255,
            smooth,
            url: None,
            state: LoadState::Empty,
            loader: None,
            pending: None,
            load_error: None,
            listeners: VecDeque::new(),
            destroyed: false,
        }
    }

    // --- Loading ---

    /// Start loading `url` into this bitmap, replacing any load in flight.
    ///
    /// The current pixels are discarded; the bitmap is `Loading` until the
    /// result is applied by `poll_load` or `wait_for_load`.
    pub fn load_url(&mut self, loader: &AssetLoader, url: &str) -> BitmapResult<()> {
        self.ensure_alive()?;
        self.start_load(loader.clone(), url.to_string());
        Ok(())
    }

    fn start_load(&mut self, loader: AssetLoader, url: String) {
        self.pending = Some(loader.start(&url));
        self.loader = Some(loader);
        self.url = Some(url);
        self.load_error = None;
        self.buffer = PixelBuffer::default();
        self.state = LoadState::Loading;
        self.mark_dirty();
    }

    /// Re-issue the failed fetch. Has no effect unless the bitmap is in the `Error` state.
    pub fn retry(&mut self) -> BitmapResult<()> {
        self.ensure_alive()?;
        if self.state != LoadState::Error {
            return Ok(());
        }
        if let (Some(loader), Some(url)) = (self.loader.clone(), self.url.clone()) {
            log::info!(target: "bitmap", "retrying {}", url);
            self.start_load(loader, url);
        }
        Ok(())
    }

    /// Apply a finished load, if any. Call once per frame while loading.
    ///
    /// Returns the state after polling.
    pub fn poll_load(&mut self) -> LoadState {
        if let Some(outcome) = self.pending.as_mut().and_then(PendingLoad::try_take) {
            self.pending = None;
            self.finish_load(outcome);
        }
        self.state
    }

    /// Block until the load in flight resolves and apply it.
    ///
    /// Returns immediately when nothing is loading. Must not be called from
    /// within an async context.
    pub fn wait_for_load(&mut self) -> LoadState {
        if let Some(pending) = self.pending.take() {
            let outcome = pending.wait();
            self.finish_load(outcome);
        }
        self.state
    }

    fn finish_load(&mut self, outcome: LoadOutcome) {
        match outcome {
            Ok(decoded) => {
                log::info!(
                    target: "bitmap",
                    "loaded {} ({}x{})",
                    self.url.as_deref().unwrap_or_default(),
                    decoded.pixels.width(),
                    decoded.pixels.height()
                );
                self.buffer = decoded.pixels;
                self.state = LoadState::Ready;
            }
            Err(err) => {
                log::warn!(target: "bitmap", "{}", err);
                self.buffer = PixelBuffer::default();
                self.load_error = Some(err);
                self.state = LoadState::Error;
            }
        }
        self.mark_dirty();
        self.call_load_listeners();
    }

    fn call_load_listeners(&mut self) {
        let mut listeners = std::mem::take(&mut self.listeners);
        while let Some(listener) = listeners.pop_front() {
            listener(self);
        }
    }

    /// Register a callback for when the bitmap finishes loading.
    ///
    /// If the bitmap is already `Ready` or `Error`, the callback runs now.
    /// Otherwise it runs exactly once, in registration order, when the load resolves.
    pub fn add_load_listener(&mut self, listener: impl FnOnce(&Bitmap) + 'static) -> BitmapResult<()> {
        self.ensure_alive()?;
        match self.state {
            LoadState::Ready | LoadState::Error => listener(self),
            LoadState::Empty | LoadState::Loading => self.listeners.push_back(Box::new(listener)),
        }
        Ok(())
    }

    // --- Lifecycle ---

    /// Release the pixels and the texture.
    ///
    /// A load in flight is abandoned and its listeners never run. Calling
    /// `destroy` again does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        log::debug!(target: "bitmap", "destroy {:?}", self.url);
        self.destroyed = true;
        self.pending = None;
        self.loader = None;
        self.listeners.clear();
        self.buffer = PixelBuffer::default();
        self.texture = None;
    }

    /// Resize the bitmap, keeping the top-left overlap of the old pixels.
    ///
    /// Also turns an `Empty` or `Error` bitmap into a ready one of the given size.
    pub fn resize(&mut self, width: i32, height: i32) -> BitmapResult<()> {
        self.ensure_alive()?;
        if self.state == LoadState::Loading {
            return Err(BitmapError::NotReady { state: self.state });
        }
        let (width, height) = validate_dimensions(i64::from(width), i64::from(height))?;
        log::debug!(target: "bitmap", "resize {}x{}", width, height);
        self.buffer = self.buffer.resized(width, height);
        self.state = LoadState::Ready;
        self.load_error = None;
        self.mark_dirty();
        Ok(())
    }

    // --- State queries ---

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// The bounds of the bitmap, `(0, 0, width, height)`.
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width() as f32, self.height() as f32)
    }

    /// The url this bitmap was loaded from, if any.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    /// Whether the bitmap can be drawn and read.
    pub fn is_ready(&self) -> bool {
        !self.destroyed && self.state == LoadState::Ready
    }

    /// Whether the last load failed.
    pub fn is_error(&self) -> bool {
        !self.destroyed && self.state == LoadState::Error
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Why the last load failed.
    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    // --- Attributes ---

    pub fn smooth(&self) -> bool {
        self.smooth
    }

    /// Choose bilinear (true) or nearest-neighbor (false) scaling.
    pub fn set_smooth(&mut self, smooth: bool) {
        self.smooth = smooth;
        if let Some(texture) = self.texture.as_mut() {
            texture.set_scale_mode(ScaleMode::from_smooth(smooth));
        }
    }

    /// Paint opacity in the range 0-255.
    pub fn paint_opacity(&self) -> u8 {
        self.paint_opacity
    }

    /// Set the paint opacity, clamped to 0-255. NaN is ignored.
    pub fn set_paint_opacity(&mut self, opacity: f32) {
        if opacity.is_nan() {
            log::warn!(target: "bitmap", "ignoring NaN paint opacity");
            return;
        }
        self.paint_opacity = opacity.clamp(0.0, 255.0).round() as u8;
    }

    pub fn text_style(&self) -> &TextStyle {
        &self.style
    }

    pub fn text_style_mut(&mut self) -> &mut TextStyle {
        &mut self.style
    }

    /// Set the font size in pixels. Non-finite or negative values are ignored.
    pub fn set_font_size(&mut self, size: f32) {
        self.style.set_font_size(size);
    }

    /// Set the outline width in pixels. Non-finite or negative values are ignored.
    pub fn set_outline_width(&mut self, width: f32) {
        self.style.set_outline_width(width);
    }

    /// The font library this bitmap draws text with.
    pub fn fonts(&self) -> &SharedFonts {
        &self.fonts
    }

    /// The drawable handle, re-uploaded first if the pixels changed.
    pub fn base_texture(&mut self) -> BitmapResult<&BaseTexture> {
        self.ensure_alive()?;
        let dirty = std::mem::replace(&mut self.texture_dirty, false);
        let texture = self.texture.as_mut().ok_or(BitmapError::UseAfterDestroy)?;
        if dirty {
            texture.upload(&self.buffer);
        }
        Ok(&*texture)
    }

    // --- Internal helpers ---

    pub(crate) fn ensure_alive(&self) -> BitmapResult<()> {
        if self.destroyed {
            log::error!(target: "bitmap", "operation on destroyed bitmap {:?}", self.url);
            return Err(BitmapError::UseAfterDestroy);
        }
        Ok(())
    }

    pub(crate) fn ensure_ready(&self) -> BitmapResult<()> {
        self.ensure_alive()?;
        if self.state != LoadState::Ready {
            return Err(BitmapError::NotReady { state: self.state });
        }
        Ok(())
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.texture_dirty = true;
    }

    /// Run `draw` against the pixel buffer. Zero-area bitmaps skip drawing.
    pub(crate) fn render(&mut self, draw: impl FnOnce(&mut tiny_skia::PixmapMut<'_>)) {
        if let Some(mut pixmap) = self.buffer.pixmap_mut() {
            draw(&mut pixmap);
        }
        self.mark_dirty();
    }
}

/// Check requested dimensions and convert them to pixel counts.
fn validate_dimensions(width: i64, height: i64) -> BitmapResult<(u32, u32)> {
    let max = i64::from(MAX_DIMENSION);
    if !(0..=max).contains(&width) || !(0..=max).contains(&height) {
        log::error!(target: "bitmap", "invalid bitmap dimensions {}x{}", width, height);
        return Err(BitmapError::InvalidDimension { width, height });
    }
    Ok((width as u32, height as u32))
}
