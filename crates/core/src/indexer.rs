use gameshelf_config::Settings;
use gameshelf_models::{Candidate, Entry, Kind, ListingQuery, NameMatcher, Page, ResolvedFile};
use gameshelf_utils::datetime::system_time_to_local;
use gameshelf_utils::media_types::{ExtensionTable, classify, has_extension_in};
use gameshelf_utils::path::{is_hidden_name, normalize_relative, relative_ref};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::IndexError;

/// Outcome of browsing a root-relative path.
#[derive(Debug, Clone, PartialEq)]
pub enum Browse {
    Listing(Page<Entry>),
    /// The path is a regular file; serving its bytes is the caller's job.
    File(ResolvedFile),
}

/// Lists, classifies, filters and paginates the content tree under one root.
///
/// Cloning is cheap; clones share the extension table and worker pool.
#[derive(Debug, Clone)]
pub struct Indexer {
    root: Arc<Path>,
    table: Arc<ExtensionTable>,
    blocked_downloads: Arc<[String]>,
    items_per_page: usize,
    skip_hidden: bool,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Indexer {
    /// Creates an indexer rooted at `settings.root_dir`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`PermissionDenied` if the root cannot be resolved and
    /// `NotADirectory` if it is not a directory.
    pub fn new(settings: &Settings) -> Result<Self, IndexError> {
        let root = fs::canonicalize(&settings.root_dir).map_err(|e| IndexError::from_io(&settings.root_dir, e))?;
        if !root.is_dir() {
            return Err(IndexError::NotADirectory(root));
        }

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(settings.worker_threads.max(1))
            .thread_name(|i| format!("gameshelf-index-{i}"))
            .build()
        {
            Ok(pool) => Some(Arc::new(pool)),
            Err(e) => {
                warn!("Indexer: failed to build worker pool, using the global pool: {}", e);
                None
            }
        };

        info!("Indexer: serving {}", root.display());

        Ok(Self {
            root: Arc::from(root),
            table: Arc::new(ExtensionTable::new(
                &settings.downloadable_extensions,
                &settings.image_extensions,
            )),
            blocked_downloads: settings.blocked_download_extensions.clone().into(),
            items_per_page: settings.items_per_page.max(1),
            skip_hidden: settings.skip_hidden_files,
            pool,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    #[must_use]
    pub fn table(&self) -> &ExtensionTable {
        &self.table
    }

    /// Resolves a root-relative path to a canonical path inside the root.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if the path escapes the root, lexically or via symlinks
    /// - `NotFound` / `PermissionDenied` if it cannot be resolved
    pub fn resolve(&self, subpath: &str) -> Result<PathBuf, IndexError> {
        let relative = normalize_relative(subpath).ok_or_else(|| {
            warn!("Indexer: rejected traversal attempt {:?}", subpath);
            IndexError::InvalidPath(subpath.to_string())
        })?;

        let joined = self.root.join(&relative);
        let canonical = fs::canonicalize(&joined).map_err(|e| IndexError::from_io(&joined, e))?;

        if !canonical.starts_with(&self.root) {
            warn!(
                "Indexer: {:?} resolves outside the root to {}",
                subpath,
                canonical.display()
            );
            return Err(IndexError::InvalidPath(subpath.to_string()));
        }

        Ok(canonical)
    }

    /// Root-relative reference for a resolved path, `/`-separated.
    #[must_use]
    pub fn reference_for(&self, path: &Path) -> Option<String> {
        relative_ref(&self.root, path)
    }

    /// Lists the immediate children of `subpath`, or hands back the file it names.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidPath`, `NotFound`, `PermissionDenied` or `Io` when the
    /// path cannot be resolved or the directory cannot be read.
    pub async fn browse(&self, subpath: &str, query: &ListingQuery) -> Result<Browse, IndexError> {
        let this = self.clone();
        let subpath = subpath.to_owned();
        let query = query.clone();

        tokio::task::spawn_blocking(move || this.browse_blocking(&subpath, &query))
            .await
            .map_err(|e| IndexError::Join(e.to_string()))?
    }

    /// Builds the home view: every second-level directory of every bucket.
    ///
    /// # Errors
    ///
    /// Fails if the root itself cannot be read.
    pub async fn home(&self, query: &ListingQuery) -> Result<Page<Candidate>, IndexError> {
        let this = self.clone();
        let query = query.clone();

        tokio::task::spawn_blocking(move || this.home_blocking(&query))
            .await
            .map_err(|e| IndexError::Join(e.to_string()))?
    }

    /// Sorted names of the first-level bucket directories.
    ///
    /// # Errors
    ///
    /// Fails if the root cannot be read.
    pub async fn buckets(&self) -> Result<Vec<String>, IndexError> {
        let this = self.clone();

        tokio::task::spawn_blocking(move || this.buckets_blocking())
            .await
            .map_err(|e| IndexError::Join(e.to_string()))?
    }

    /// Resolves a file for download.
    ///
    /// # Errors
    ///
    /// Besides resolution errors, fails with `NotAFile` for directories and
    /// `Forbidden` for extensions blocked from download.
    pub async fn resolve_download(&self, subpath: &str) -> Result<ResolvedFile, IndexError> {
        let this = self.clone();
        let subpath = subpath.to_owned();

        tokio::task::spawn_blocking(move || {
            let path = this.resolve(&subpath)?;
            let file = this.resolved_file(&path)?;
            if has_extension_in(&file.name, &this.blocked_downloads[..]) {
                info!("Indexer: download of {} refused", path.display());
                return Err(IndexError::Forbidden(path));
            }
            Ok(file)
        })
        .await
        .map_err(|e| IndexError::Join(e.to_string()))?
    }

    fn browse_blocking(&self, subpath: &str, query: &ListingQuery) -> Result<Browse, IndexError> {
        info!("Indexer: browsing {:?} (page {})", subpath, query.page_number());

        let path = self.resolve(subpath)?;
        let metadata = fs::metadata(&path).map_err(|e| IndexError::from_io(&path, e))?;
        if !metadata.is_dir() {
            return self.resolved_file(&path).map(Browse::File);
        }

        let matcher = query.matcher();
        let mut entries = self.list_children(&path, &matcher)?;
        entries.sort_by_cached_key(entry_order);

        debug!("Indexer: {} entries in {}", entries.len(), path.display());

        let mut page = Page::from_items(entries, query.page_number(), self.items_per_page);
        self.attach_entry_thumbnails(&path, &mut page.items);

        Ok(Browse::Listing(page))
    }

    fn list_children(&self, dir: &Path, matcher: &NameMatcher) -> Result<Vec<Entry>, IndexError> {
        let read_dir = fs::read_dir(dir).map_err(|e| IndexError::from_io(dir, e))?;

        let mut entries = Vec::new();
        for item in read_dir {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    warn!("Indexer: skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            let Some(name) = item.file_name().to_str().map(str::to_owned) else {
                warn!("Indexer: skipping non UTF-8 name in {}", dir.display());
                continue;
            };
            if self.skip_hidden && is_hidden_name(&name) {
                continue;
            }
            if !matcher.matches(&name) {
                continue;
            }

            // Follow symlinks so a linked folder lists as a directory.
            let metadata = match fs::metadata(item.path()) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Indexer: skipping {}: {}", item.path().display(), e);
                    continue;
                }
            };

            let entry = if metadata.is_dir() {
                Entry::directory(name)
            } else {
                let kind = classify(&name, false, &self.table);
                Entry::file(name, kind, metadata.len())
            };
            entries.push(entry.with_modified(system_time_to_local(metadata.modified())));
        }

        Ok(entries)
    }

    fn attach_entry_thumbnails(&self, dir: &Path, entries: &mut [Entry]) {
        let attach = |entry: &mut Entry| {
            let child = dir.join(&*entry.name);
            entry.thumbnail_ref = match entry.kind {
                Kind::Image => self.contained_ref(&child),
                Kind::Directory => self.first_image(&child).and_then(|image| self.reference_for(&image)),
                Kind::Downloadable | Kind::Other => None,
            };
        };

        self.run(|| entries.par_iter_mut().for_each(attach));
    }

    fn home_blocking(&self, query: &ListingQuery) -> Result<Page<Candidate>, IndexError> {
        let bucket_filter = query.bucket_filter();
        info!(
            "Indexer: home view (search: {:?}, bucket: {:?}, page {})",
            query.search,
            bucket_filter,
            query.page_number()
        );

        let matcher = query.matcher();
        let skip_hidden = self.skip_hidden;

        let walker = WalkDir::new(&*self.root)
            .min_depth(2)
            .max_depth(2)
            .follow_links(true)
            .into_iter()
            .filter_entry(move |e| {
                if e.depth() == 0 {
                    return true;
                }
                let name = e.file_name().to_str().unwrap_or_default();
                if skip_hidden && is_hidden_name(name) {
                    return false;
                }
                e.depth() != 1 || bucket_filter.is_none_or(|bucket| bucket == name)
            });

        let mut candidates = Vec::new();
        for item in walker {
            let item = match item {
                Ok(item) => item,
                Err(err) if err.depth() == 0 => return Err(walk_error(&self.root, err)),
                Err(err) => {
                    warn!("Indexer: skipping unreadable bucket entry: {}", err);
                    continue;
                }
            };

            if !item.file_type().is_dir() {
                continue;
            }
            let Some(name) = item.file_name().to_str() else {
                continue;
            };
            if !matcher.matches(name) {
                continue;
            }
            let Some(bucket) = item
                .path()
                .parent()
                .and_then(Path::file_name)
                .and_then(|b| b.to_str())
            else {
                continue;
            };

            candidates.push(Candidate::new(bucket, name));
        }

        candidates.sort_by_cached_key(|c| (name_order(&c.bucket), name_order(&c.name)));
        debug!("Indexer: home view found {} candidates", candidates.len());

        let mut page = Page::from_items(candidates, query.page_number(), self.items_per_page);
        let root = Arc::clone(&self.root);
        self.run(|| {
            page.items.par_iter_mut().for_each(|candidate| {
                let dir = root.join(&*candidate.bucket).join(&*candidate.name);
                candidate.thumbnail_ref = self.first_image(&dir).and_then(|image| self.reference_for(&image));
            });
        });

        Ok(page)
    }

    fn buckets_blocking(&self) -> Result<Vec<String>, IndexError> {
        let read_dir = fs::read_dir(&self.root).map_err(|e| IndexError::from_io(&*self.root, e))?;

        let mut buckets: Vec<String> = read_dir
            .filter_map(Result::ok)
            .filter(|e| fs::metadata(e.path()).is_ok_and(|m| m.is_dir()))
            .filter_map(|e| e.file_name().to_str().map(str::to_owned))
            .filter(|name| !(self.skip_hidden && is_hidden_name(name)))
            .collect();
        buckets.sort_by_cached_key(|name| (name.to_lowercase(), name.clone()));

        Ok(buckets)
    }

    /// The lexicographically first image file directly inside `dir`.
    fn first_image(&self, dir: &Path) -> Option<PathBuf> {
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                debug!("Indexer: no thumbnail probe for {}: {}", dir.display(), e);
                return None;
            }
        };

        read_dir
            .filter_map(Result::ok)
            .filter_map(|e| {
                let name = e.file_name().into_string().ok()?;
                if self.skip_hidden && is_hidden_name(&name) {
                    return None;
                }
                if classify(&name, false, &self.table) != Kind::Image {
                    return None;
                }
                fs::metadata(e.path()).ok().filter(fs::Metadata::is_file)?;
                self.within_root(&e.path()).then_some(name)
            })
            .min()
            .map(|name| dir.join(name))
    }

    /// Reference for `path`, only if its canonical target stays inside the root.
    fn contained_ref(&self, path: &Path) -> Option<String> {
        if self.within_root(path) {
            self.reference_for(path)
        } else {
            None
        }
    }

    fn within_root(&self, path: &Path) -> bool {
        match fs::canonicalize(path) {
            Ok(canonical) if canonical.starts_with(&self.root) => true,
            Ok(canonical) => {
                warn!(
                    "Indexer: no thumbnail for {}, it points outside the root to {}",
                    path.display(),
                    canonical.display()
                );
                false
            }
            Err(_) => false,
        }
    }

    fn resolved_file(&self, path: &Path) -> Result<ResolvedFile, IndexError> {
        let metadata = fs::metadata(path).map_err(|e| IndexError::from_io(path, e))?;
        if metadata.is_dir() {
            return Err(IndexError::NotAFile(path.to_path_buf()));
        }

        let name: Arc<str> = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .into();
        let kind = classify(&name, false, &self.table);

        Ok(ResolvedFile {
            path: path.to_path_buf(),
            name,
            kind,
            size_bytes: metadata.len(),
        })
    }

    fn run<F: FnOnce() + Send>(&self, op: F) {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

/// Case-insensitive name, then exact name. Shared by listings, the home view
/// and the bucket list.
fn name_order(name: &Arc<str>) -> (String, Arc<str>) {
    (name.to_lowercase(), Arc::clone(name))
}

/// Directories first, then [`name_order`].
fn entry_order(entry: &Entry) -> (bool, String, Arc<str>) {
    let (folded, exact) = name_order(&entry.name);
    (!entry.is_directory, folded, exact)
}

fn walk_error(root: &Path, err: walkdir::Error) -> IndexError {
    let path = err.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
    match err.into_io_error() {
        Some(io) => IndexError::from_io(path, io),
        None => IndexError::Io {
            path,
            source: std::io::Error::other("filesystem loop detected"),
        },
    }
}
