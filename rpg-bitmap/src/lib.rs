//! Lazily-loaded 2D raster surfaces for game rendering, using tiny-skia and cosmic-text.
//!
//! A [`Bitmap`] is a pixel buffer with drawing primitives, text rendering, pixel
//! queries and an asynchronous load lifecycle. It uses:
//! - `tiny-skia` for 2D graphics rendering
//! - `cosmic-text` for text shaping, measurement, and glyph outlines
//! - `fontdb` for font database management
//! - `image` and `tokio` for loading PNG/JPEG files in the background
//!
//! # Example
//!
//! ```rust,ignore
//! use rpg_bitmap::{AssetLoader, Bitmap, DirectorySource, TextAlign};
//!
//! let mut window = Bitmap::new(400, 300)?;
//! window.fill_rect(10.0, 10.0, 100.0, 50.0, "#ff0000")?;
//! window.draw_text("Potion", 10.0, 80.0, Some(200.0), 36.0, TextAlign::Left)?;
//!
//! let loader = AssetLoader::new(DirectorySource::new("game"))?;
//! let mut face = Bitmap::load(&loader, "img/faces/Actor1.png");
//! face.add_load_listener(|face| println!("loaded {}x{}", face.width(), face.height()))?;
//! // Once per frame:
//! face.poll_load();
//! ```

mod bitmap;
mod color;
mod error;
mod font_config;
mod geometry;
mod loader;
mod pixels;
mod style;
mod text;
mod texture;

// Re-export public API
pub use bitmap::{Bitmap, LoadListener, LoadState, RenderSource, MAX_DIMENSION};
pub use color::{parse_color, to_hex};
pub use error::{BitmapError, BitmapResult, LoadError};
pub use font_config::{
    font_config_to_fontdb, CustomFont, FontConfig, FontLibrary, GenericFamilyMap, SharedFonts,
};
pub use geometry::{BltParams, Rect};
pub use loader::{AssetLoader, DirectorySource, ImageSource, LoaderConfig, MemorySource};
pub use style::{ScaleMode, TextAlign, TextStyle};
pub use texture::BaseTexture;
