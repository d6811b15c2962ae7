//! Asynchronous image loading.
//!
//! An [`AssetLoader`] fetches encoded image bytes from an [`ImageSource`] on a
//! tokio runtime and decodes them on the blocking pool. The decoded pixels are
//! handed back through a one-shot channel that the owning bitmap polls on its
//! own thread, so a bitmap's buffer only changes between frames.

use crate::bitmap::MAX_DIMENSION;
use crate::error::LoadError;
use crate::pixels::PixelBuffer;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::oneshot;

/// A place encoded images are fetched from.
pub trait ImageSource: Send + Sync + 'static {
    /// Fetch the encoded bytes of the image identified by `url`.
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, LoadError>>;
}

/// Reads images from files below a root directory.
///
/// Urls are relative paths such as `img/pictures/Actor1.png`. Absolute paths and
/// `..` components are rejected with [`LoadError::AccessDenied`].
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, LoadError> {
        let relative = Path::new(url);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(LoadError::AccessDenied {
                url: url.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl ImageSource for DirectorySource {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, LoadError>> {
        let url = url.to_string();
        let path = self.resolve(&url);
        async move {
            let path = path?;
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(bytes),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    Err(LoadError::NotFound { url })
                }
                Err(source) => Err(LoadError::Io { url, source }),
            }
        }
        .boxed()
    }
}

/// Serves images from memory. Entries can be added and removed while loads run.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Arc<RwLock<HashMap<String, Arc<Vec<u8>>>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register encoded image bytes under `url`, replacing any previous entry.
    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.write_entries().insert(url.into(), Arc::new(bytes));
    }

    /// Remove the entry for `url`. Returns true if it existed.
    pub fn remove(&self, url: &str) -> bool {
        self.write_entries().remove(url).is_some()
    }

    // The map stays consistent across a panicking writer, so a poisoned lock is recovered
    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Vec<u8>>>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            log::warn!(target: "bitmap::loader", "memory source lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl ImageSource for MemorySource {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, LoadError>> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned();
        let result = match entry {
            Some(bytes) => Ok(bytes.as_ref().clone()),
            None => Err(LoadError::NotFound {
                url: url.to_string(),
            }),
        };
        futures::future::ready(result).boxed()
    }
}

/// Loader settings.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Worker threads of the runtime an [`AssetLoader`] creates for itself.
    pub worker_threads: usize,
    /// Images wider or taller than this fail with [`LoadError::TooLarge`].
    pub max_dimension: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            max_dimension: MAX_DIMENSION,
        }
    }
}

enum RuntimeSlot {
    Owned(Runtime),
    Borrowed(Handle),
}

impl RuntimeSlot {
    fn handle(&self) -> &Handle {
        match self {
            RuntimeSlot::Owned(runtime) => runtime.handle(),
            RuntimeSlot::Borrowed(handle) => handle,
        }
    }
}

struct LoaderInner {
    runtime: RuntimeSlot,
    source: Arc<dyn ImageSource>,
    config: LoaderConfig,
}

/// Decoded image pixels, ready to become a bitmap's buffer.
#[derive(Debug)]
pub(crate) struct DecodedImage {
    pub pixels: PixelBuffer,
}

pub(crate) type LoadOutcome = Result<DecodedImage, LoadError>;

/// A load in flight. Dropping it discards the result when it arrives.
pub(crate) struct PendingLoad {
    receiver: oneshot::Receiver<LoadOutcome>,
    url: String,
}

impl PendingLoad {
    /// The outcome if the load has finished, or `None` while it is still running.
    pub fn try_take(&mut self) -> Option<LoadOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(LoadError::Cancelled {
                url: self.url.clone(),
            })),
        }
    }

    /// Block the current thread until the load finishes.
    ///
    /// Must not be called from within an async context.
    pub fn wait(self) -> LoadOutcome {
        let url = self.url;
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(LoadError::Cancelled { url }))
    }
}

/// Fetches and decodes images in the background.
///
/// Cloning is cheap; clones share the runtime and the source.
#[derive(Clone)]
pub struct AssetLoader {
    inner: Arc<LoaderInner>,
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AssetLoader {
    /// Create a loader with its own multi-threaded runtime.
    pub fn new(source: impl ImageSource) -> Result<Self, LoadError> {
        Self::with_config(source, LoaderConfig::default())
    }

    /// Create a loader with its own runtime and explicit settings.
    pub fn with_config(source: impl ImageSource, config: LoaderConfig) -> Result<Self, LoadError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("bitmap-loader")
            .enable_all()
            .build()
            .map_err(|e| LoadError::Runtime(e.to_string()))?;
        Ok(Self::from_parts(RuntimeSlot::Owned(runtime), source, config))
    }

    /// Create a loader that spawns onto an existing runtime.
    pub fn with_handle(handle: Handle, source: impl ImageSource, config: LoaderConfig) -> Self {
        Self::from_parts(RuntimeSlot::Borrowed(handle), source, config)
    }

    fn from_parts(runtime: RuntimeSlot, source: impl ImageSource, config: LoaderConfig) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                runtime,
                source: Arc::new(source),
                config,
            }),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    /// Start fetching and decoding `url`. Returns immediately.
    pub(crate) fn start(&self, url: &str) -> PendingLoad {
        let (sender, receiver) = oneshot::channel();
        let source = Arc::clone(&self.inner.source);
        let max_dimension = self.inner.config.max_dimension;
        let task_url = url.to_string();

        log::info!(target: "bitmap::loader", "loading {}", url);
        self.inner.runtime.handle().spawn(async move {
            let outcome = fetch_and_decode(source.as_ref(), &task_url, max_dimension).await;
            if sender.send(outcome).is_err() {
                log::debug!(target: "bitmap::loader", "discarding result for {}: bitmap gone", task_url);
            }
        });

        PendingLoad {
            receiver,
            url: url.to_string(),
        }
    }
}

async fn fetch_and_decode(
    source: &dyn ImageSource,
    url: &str,
    max_dimension: u32,
) -> LoadOutcome {
    let bytes = source.fetch(url).await?;
    let task_url = url.to_string();
    tokio::task::spawn_blocking(move || decode_image(&task_url, &bytes, max_dimension))
        .await
        .map_err(|e| LoadError::Runtime(e.to_string()))?
}

/// Decode PNG/JPEG bytes into premultiplied pixels.
///
/// The header is checked against `max_dimension` before any pixels are allocated.
pub(crate) fn decode_image(url: &str, bytes: &[u8], max_dimension: u32) -> LoadOutcome {
    let decode_err = |source| LoadError::Decode {
        url: url.to_string(),
        source,
    };
    let reader = || {
        image::ImageReader::new(std::io::Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|source| LoadError::Io {
                url: url.to_string(),
                source,
            })
    };

    let (width, height) = reader()?.into_dimensions().map_err(decode_err)?;
    if width > max_dimension || height > max_dimension {
        return Err(LoadError::TooLarge {
            url: url.to_string(),
            width,
            height,
        });
    }

    let mut limits = image::Limits::default();
    limits.max_image_width = Some(max_dimension);
    limits.max_image_height = Some(max_dimension);
    let mut reader = reader()?;
    reader.limits(limits);
    let rgba = reader.decode().map_err(decode_err)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels = PixelBuffer::from_straight_rgba(width, height, rgba.into_raw())
        .ok_or_else(|| LoadError::Runtime(format!("decoded buffer size mismatch for {}", url)))?;
    log::debug!(target: "bitmap::loader", "decoded {} ({}x{})", url, width, height);
    Ok(DecodedImage { pixels })
}
