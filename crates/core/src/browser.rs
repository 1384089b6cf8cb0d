use gameshelf_config::Settings;
use gameshelf_models::{Candidate, Entry, Kind, ListingQuery, Page, ResolvedFile, Thumbnail};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{BrowseError, IndexError};
use crate::indexer::{Browse, Indexer};
use crate::thumbnail_cache::ThumbnailCache;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewedEntry {
    #[serde(flatten)]
    pub entry: Entry,
    pub preview: Option<Arc<Thumbnail>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub preview: Option<Arc<Thumbnail>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BrowseOutcome {
    Listing(Page<PreviewedEntry>),
    File(ResolvedFile),
}

/// Indexer and thumbnail cache wired together for request handlers.
///
/// Build one per process and clone the handle into each handler.
#[derive(Debug, Clone)]
pub struct Browser {
    indexer: Indexer,
    thumbnails: ThumbnailCache,
}

impl Browser {
    /// # Errors
    ///
    /// Fails if the configured root cannot be opened as a directory.
    pub fn new(settings: &Settings) -> Result<Self, IndexError> {
        Ok(Self::from_parts(Indexer::new(settings)?, ThumbnailCache::new(settings)))
    }

    #[must_use]
    pub const fn from_parts(indexer: Indexer, thumbnails: ThumbnailCache) -> Self {
        Self { indexer, thumbnails }
    }

    #[must_use]
    pub const fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    #[must_use]
    pub const fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    /// Lists `subpath` and attaches a preview to every entry that has a
    /// thumbnail reference. Preview failures leave `preview` empty.
    ///
    /// # Errors
    ///
    /// Propagates the indexer's resolution and listing errors.
    pub async fn browse(&self, subpath: &str, query: &ListingQuery) -> Result<BrowseOutcome, IndexError> {
        match self.indexer.browse(subpath, query).await? {
            Browse::File(file) => Ok(BrowseOutcome::File(file)),
            Browse::Listing(page) => {
                let refs: Vec<Option<String>> = page.items.iter().map(|e| e.thumbnail_ref.clone()).collect();
                let mut previews = self.previews(refs).await.into_iter();

                Ok(BrowseOutcome::Listing(page.map(|entry| PreviewedEntry {
                    entry,
                    preview: previews.next().flatten(),
                })))
            }
        }
    }

    /// Home view with previews for each candidate's thumbnail.
    ///
    /// # Errors
    ///
    /// Fails if the root cannot be read.
    pub async fn home(&self, query: &ListingQuery) -> Result<Page<PreviewedCandidate>, IndexError> {
        let page = self.indexer.home(query).await?;
        let refs: Vec<Option<String>> = page.items.iter().map(|c| c.thumbnail_ref.clone()).collect();
        let mut previews = self.previews(refs).await.into_iter();

        Ok(page.map(|candidate| PreviewedCandidate {
            candidate,
            preview: previews.next().flatten(),
        }))
    }

    /// Serves the preview of a single image addressed by a root-relative path.
    ///
    /// # Errors
    ///
    /// Resolution errors, `NotAnImage` for anything that is not an image file,
    /// and rendering failures.
    pub async fn thumbnail(&self, subpath: &str) -> Result<Arc<Thumbnail>, BrowseError> {
        let path = self.indexer.resolve(subpath)?;
        if !path.is_file() || self.indexer.table().kind_of_name(subpath) != Kind::Image {
            return Err(BrowseError::NotAnImage(path));
        }

        info!("Browser: thumbnail for {:?}", subpath);
        Ok(self.thumbnails.get_or_create(&path).await?)
    }

    /// Renders previews concurrently, keeping the order of `refs`.
    async fn previews(&self, refs: Vec<Option<String>>) -> Vec<Option<Arc<Thumbnail>>> {
        let mut previews = vec![None; refs.len()];
        let mut join_set = JoinSet::new();

        for (idx, reference) in refs.into_iter().enumerate() {
            let Some(reference) = reference else {
                continue;
            };
            // Resolved the way `thumbnail` resolves; escaping refs get no preview.
            let path = match self.indexer.resolve(&reference) {
                Ok(path) => path,
                Err(e) => {
                    warn!("Browser: no preview for {}: {}", reference, e);
                    continue;
                }
            };
            let cache = self.thumbnails.clone();

            join_set.spawn(async move {
                match cache.get_or_create(&path).await {
                    Ok(thumbnail) => (idx, Some(thumbnail)),
                    Err(e) => {
                        warn!("Browser: rendering {} without preview: {}", reference, e);
                        (idx, None)
                    }
                }
            });
        }

        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((idx, preview)) => previews[idx] = preview,
                Err(e) => warn!("Browser: preview task failed: {}", e),
            }
        }

        debug!(
            "Browser: {} of {} previews ready",
            previews.iter().filter(|p| p.is_some()).count(),
            previews.len()
        );
        previews
    }
}
