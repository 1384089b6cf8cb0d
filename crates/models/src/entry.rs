use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Directory,
    Downloadable,
    Image,
    Other,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Directory => write!(f, "directory"),
            Kind::Downloadable => write!(f, "downloadable"),
            Kind::Image => write!(f, "image"),
            Kind::Other => write!(f, "other"),
        }
    }
}

/// One immediate child of a browsed directory.
///
/// `size_bytes` is only set for files. `thumbnail_ref` is a root-relative,
/// `/`-separated path to the image that previews this entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub name: Arc<str>,
    pub is_directory: bool,
    pub kind: Kind,
    pub size_bytes: Option<u64>,
    pub modified: Option<DateTime<Local>>,
    pub thumbnail_ref: Option<String>,
}

impl Entry {
    #[must_use]
    pub fn directory(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            kind: Kind::Directory,
            size_bytes: None,
            modified: None,
            thumbnail_ref: None,
        }
    }

    #[must_use]
    pub fn file(name: impl Into<Arc<str>>, kind: Kind, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            kind,
            size_bytes: Some(size_bytes),
            modified: None,
            thumbnail_ref: None,
        }
    }

    #[must_use]
    pub fn with_modified(mut self, modified: Option<DateTime<Local>>) -> Self {
        self.modified = modified;
        self
    }

    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self.kind, Kind::Image)
    }
}

/// A game folder found by the two-level bucket scan of the home view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub bucket: Arc<str>,
    pub name: Arc<str>,
    pub path: String,
    pub thumbnail_ref: Option<String>,
}

impl Candidate {
    #[must_use]
    pub fn new(bucket: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        let bucket = bucket.into();
        let name = name.into();
        let path = format!("{bucket}/{name}");
        Self {
            bucket,
            name,
            path,
            thumbnail_ref: None,
        }
    }
}

/// A path that resolved to a regular file inside the root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub name: Arc<str>,
    pub kind: Kind,
    pub size_bytes: u64,
}
