use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("file type is not available for download: {}", .0.display())]
    Forbidden(PathBuf),

    #[error("IO error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("listing task failed: {0}")]
    Join(String),
}

impl IndexError {
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            // A component that is a regular file means the path does not exist.
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::InvalidInput => Self::InvalidPath(path.display().to_string()),
            _ => Self::Io { path, source },
        }
    }

    /// Permission failures are reported to callers the same way as missing paths.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::PermissionDenied(_))
    }
}

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("failed to read image {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode thumbnail for {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("thumbnail task failed: {0}")]
    Join(String),
}

#[derive(Error, Debug)]
pub enum BrowseError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),

    #[error("not an image: {}", .0.display())]
    NotAnImage(PathBuf),
}
