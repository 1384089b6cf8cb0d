use ahash::AHashMap;
use gameshelf_models::Kind;
use std::path::Path;

/// Table-driven mapping from lower-cased file extension to [`Kind`].
#[derive(Debug, Clone, Default)]
pub struct ExtensionTable {
    kinds: AHashMap<String, Kind>,
}

impl ExtensionTable {
    /// Builds the table from the configured extension lists.
    ///
    /// Extensions may be given with or without a leading dot and in any case.
    /// An extension present in both lists is classified as an image.
    #[must_use]
    pub fn new<D, I>(downloadable: D, image: I) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut kinds = AHashMap::new();
        for ext in downloadable {
            if let Some(ext) = normalize_extension(ext.as_ref()) {
                kinds.insert(ext, Kind::Downloadable);
            }
        }
        for ext in image {
            if let Some(ext) = normalize_extension(ext.as_ref()) {
                kinds.insert(ext, Kind::Image);
            }
        }
        Self { kinds }
    }

    #[must_use]
    pub fn kind_of_extension(&self, extension: &str) -> Kind {
        self.kinds
            .get(&extension.to_lowercase())
            .copied()
            .unwrap_or(Kind::Other)
    }

    #[must_use]
    pub fn kind_of_name(&self, name: &str) -> Kind {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map_or(Kind::Other, |ext| self.kind_of_extension(ext))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Classifies a filesystem node. Directories are always [`Kind::Directory`].
#[must_use]
pub fn classify(name: &str, is_directory: bool, table: &ExtensionTable) -> Kind {
    if is_directory {
        Kind::Directory
    } else {
        table.kind_of_name(name)
    }
}

/// True when `name` has one of the `extensions` (case-insensitive, dot optional).
#[must_use]
pub fn has_extension_in<S: AsRef<str>>(name: &str, extensions: &[S]) -> bool {
    let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_lowercase();
    extensions
        .iter()
        .filter_map(|candidate| normalize_extension(candidate.as_ref()))
        .any(|candidate| candidate == ext)
}

fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}
