//! Error types for rpg-bitmap.

use crate::bitmap::LoadState;
use thiserror::Error;

/// Result type alias using BitmapError.
pub type BitmapResult<T> = Result<T, BitmapError>;

/// Errors that can occur in bitmap operations.
#[derive(Debug, Error)]
pub enum BitmapError {
    /// Invalid bitmap dimensions (must be non-negative and within limits).
    #[error("Invalid dimensions: width={width}, height={height}")]
    InvalidDimension { width: i64, height: i64 },

    /// A drawing or query operation was attempted before the bitmap was ready.
    #[error("Bitmap is not ready (state: {state:?})")]
    NotReady { state: LoadState },

    /// The bitmap has been destroyed.
    #[error("Bitmap used after destroy")]
    UseAfterDestroy,

    /// Synchronous image decoding failed.
    #[error("Failed to load image: {0}")]
    LoadFailure(#[from] LoadError),

    /// Failed to parse color value.
    #[error("Failed to parse color: {0}")]
    ColorParse(String),

    /// Invalid argument value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    Png(String),
}

impl From<png::EncodingError> for BitmapError {
    fn from(err: png::EncodingError) -> Self {
        BitmapError::Png(err.to_string())
    }
}

/// Errors produced while fetching or decoding an image.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image source has no resource under this url.
    #[error("Image not found: {url}")]
    NotFound { url: String },

    /// The url resolves outside the area the source may read from.
    #[error("Access denied for image url: {url}")]
    AccessDenied { url: String },

    /// Reading the resource failed.
    #[error("Failed to read image {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The fetched bytes are not a decodable image.
    #[error("Failed to decode image {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },

    /// The decoded image exceeds the configured maximum dimension.
    #[error("Image {url} is too large: {width}x{height}")]
    TooLarge { url: String, width: u32, height: u32 },

    /// The loading task ended without delivering a result.
    #[error("Loading of {url} was cancelled")]
    Cancelled { url: String },

    /// The loader runtime could not be started.
    #[error("Loader runtime error: {0}")]
    Runtime(String),
}

impl LoadError {
    /// The url this error refers to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            LoadError::NotFound { url }
            | LoadError::AccessDenied { url }
            | LoadError::Io { url, .. }
            | LoadError::Decode { url, .. }
            | LoadError::TooLarge { url, .. }
            | LoadError::Cancelled { url } => Some(url),
            LoadError::Runtime(_) => None,
        }
    }
}
