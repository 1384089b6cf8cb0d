mod browser;
mod error;
mod indexer;
mod thumbnail_cache;

pub use browser::{BrowseOutcome, Browser, PreviewedCandidate, PreviewedEntry};
pub use error::{BrowseError, IndexError, ThumbnailError};
pub use indexer::{Browse, Indexer};
pub use thumbnail_cache::{CacheStats, ImageRenderer, RenderedThumbnail, ThumbnailCache, ThumbnailRenderer, cache_key};
