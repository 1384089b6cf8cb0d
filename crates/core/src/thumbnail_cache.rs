use gameshelf_config::Settings;
use gameshelf_models::{Thumbnail, ThumbnailFormat};
use image::{DynamicImage, ImageError, ImageFormat};
use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::error::ThumbnailError;

/// Encoded preview produced by a [`ThumbnailRenderer`], before it is keyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedThumbnail {
    pub width: u32,
    pub height: u32,
    pub format: ThumbnailFormat,
    pub bytes: Vec<u8>,
}

/// Decodes a source image and encodes a bounded preview of it.
pub trait ThumbnailRenderer: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`ThumbnailError`] if the source cannot be read, decoded or
    /// the preview cannot be encoded.
    fn render(&self, path: &Path, max_dimension: u32) -> Result<RenderedThumbnail, ThumbnailError>;
}

/// [`ThumbnailRenderer`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRenderer {
    format: ThumbnailFormat,
}

impl ImageRenderer {
    #[must_use]
    pub const fn new(format: ThumbnailFormat) -> Self {
        Self { format }
    }
}

impl ThumbnailRenderer for ImageRenderer {
    fn render(&self, path: &Path, max_dimension: u32) -> Result<RenderedThumbnail, ThumbnailError> {
        let source = image::open(path).map_err(|e| match e {
            ImageError::IoError(source) => ThumbnailError::Io {
                path: path.to_path_buf(),
                source,
            },
            source => ThumbnailError::Decode {
                path: path.to_path_buf(),
                source,
            },
        })?;

        // Never upscale; `thumbnail` keeps the aspect ratio.
        let preview = if source.width() > max_dimension || source.height() > max_dimension {
            source.thumbnail(max_dimension, max_dimension)
        } else {
            source
        };

        let (encodable, image_format) = match self.format {
            ThumbnailFormat::Png => (DynamicImage::ImageRgba8(preview.to_rgba8()), ImageFormat::Png),
            ThumbnailFormat::Jpeg => (DynamicImage::ImageRgb8(preview.to_rgb8()), ImageFormat::Jpeg),
        };

        let mut buffer = Cursor::new(Vec::new());
        encodable
            .write_to(&mut buffer, image_format)
            .map_err(|source| ThumbnailError::Encode {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(RenderedThumbnail {
            width: encodable.width(),
            height: encodable.height(),
            format: self.format,
            bytes: buffer.into_inner(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: Option<usize>,
    pub hits: u64,
    pub misses: u64,
    pub failures: u64,
    pub evictions: u64,
}

/// Process-wide memo of thumbnails keyed by a digest of the source path.
///
/// Cloning yields another handle to the same cache. The key ignores file
/// contents, so an image modified in place keeps its old preview until the
/// cache is cleared. Concurrent misses on one key may both render; the last
/// store wins.
#[derive(Clone)]
pub struct ThumbnailCache {
    inner: Arc<Inner>,
}

struct Inner {
    entries: Mutex<LruCache<String, Arc<Thumbnail>>>,
    capacity: Option<NonZeroUsize>,
    renderer: Arc<dyn ThumbnailRenderer>,
    max_dimension: u32,
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
    evictions: AtomicU64,
}

impl fmt::Debug for ThumbnailCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailCache")
            .field("capacity", &self.inner.capacity)
            .field("max_dimension", &self.inner.max_dimension)
            .finish_non_exhaustive()
    }
}

impl ThumbnailCache {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self::with_renderer(
            Arc::new(ImageRenderer::new(settings.thumbnail_format)),
            settings.thumbnail_max_dimension,
            settings.thumbnail_cache_capacity,
        )
    }

    /// A cache using a custom renderer. `capacity` of `None` never evicts.
    #[must_use]
    pub fn with_renderer(renderer: Arc<dyn ThumbnailRenderer>, max_dimension: u32, capacity: Option<usize>) -> Self {
        let capacity = capacity.and_then(NonZeroUsize::new);
        let entries = capacity.map_or_else(LruCache::unbounded, LruCache::new);

        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(entries),
                capacity,
                renderer,
                max_dimension: max_dimension.max(1),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                failures: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    #[must_use]
    pub fn max_dimension(&self) -> u32 {
        self.inner.max_dimension
    }

    /// Returns the cached thumbnail for `path`, rendering it on a miss.
    ///
    /// # Errors
    ///
    /// Returns a [`ThumbnailError`] if rendering fails. Failures are not cached.
    pub async fn get_or_create(&self, path: &Path) -> Result<Arc<Thumbnail>, ThumbnailError> {
        let key = cache_key(path);

        if let Some(thumbnail) = self.lookup(&key).await {
            self.inner.hits.fetch_add(1, Ordering::Relaxed);
            trace!("Thumbnail cache hit for: {}", path.display());
            return Ok(thumbnail);
        }

        trace!("Thumbnail cache miss for: {}", path.display());
        self.inner.misses.fetch_add(1, Ordering::Relaxed);

        let rendered = match self.render(path.to_path_buf()).await {
            Ok(rendered) => rendered,
            Err(e) => {
                self.inner.failures.fetch_add(1, Ordering::Relaxed);
                warn!("Failed to render thumbnail for {}: {}", path.display(), e);
                return Err(e);
            }
        };

        let thumbnail = Arc::new(Thumbnail {
            key: key.clone(),
            width: rendered.width,
            height: rendered.height,
            format: rendered.format,
            bytes: rendered.bytes.into(),
        });

        let mut entries = self.inner.entries.lock().await;
        if let Some((displaced, _)) = entries.push(key.clone(), Arc::clone(&thumbnail)) {
            if displaced != key {
                self.inner.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Evicted thumbnail {}", displaced);
            }
        }
        drop(entries);

        debug!(
            "Cached {}x{} thumbnail for {}",
            thumbnail.width,
            thumbnail.height,
            path.display()
        );
        Ok(thumbnail)
    }

    /// Returns the thumbnail only if it is already cached. Not counted in
    /// [`CacheStats`].
    pub async fn get(&self, path: &Path) -> Option<Arc<Thumbnail>> {
        self.lookup(&cache_key(path)).await
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.lock().await.is_empty()
    }

    /// Drops every cached thumbnail. Counters are kept.
    pub async fn clear(&self) {
        self.inner.entries.lock().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.len().await;
        CacheStats {
            entries,
            capacity: self.inner.capacity.map(NonZeroUsize::get),
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            failures: self.inner.failures.load(Ordering::Relaxed),
            evictions: self.inner.evictions.load(Ordering::Relaxed),
        }
    }

    async fn lookup(&self, key: &str) -> Option<Arc<Thumbnail>> {
        self.inner.entries.lock().await.get(key).cloned()
    }

    async fn render(&self, path: PathBuf) -> Result<RenderedThumbnail, ThumbnailError> {
        let renderer = Arc::clone(&self.inner.renderer);
        let max_dimension = self.inner.max_dimension;

        tokio::task::spawn_blocking(move || renderer.render(&path, max_dimension))
            .await
            .map_err(|e| ThumbnailError::Join(e.to_string()))?
    }
}

/// Hex SHA-256 of the path's raw bytes. File contents are never read.
#[must_use]
pub fn cache_key(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_os_str().as_encoded_bytes());
    format!("{:x}", hasher.finalize())
}
