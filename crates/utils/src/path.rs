use std::path::{Component, Path, PathBuf};

/// Lexically normalizes a caller-supplied relative path.
///
/// `.` segments are dropped and `..` pops the previous segment. Leading `/`
/// are stripped. Returns `None` for drive prefixes or a `..` that would climb
/// above the root. An empty or `"/"`-only input normalizes to the root itself.
#[must_use]
pub fn normalize_relative(subpath: &str) -> Option<PathBuf> {
    // URL-style paths arrive with a leading slash; they are still root-relative.
    let trimmed = subpath.trim_start_matches('/');
    if Path::new(trimmed).has_root() {
        return None;
    }

    let mut normalized = PathBuf::new();
    let mut depth = 0usize;
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => {
                normalized.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                normalized.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

/// Renders `path` relative to `root` with `/` separators, for use as a
/// thumbnail or download reference.
#[must_use]
pub fn relative_ref(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Hidden entries follow the dot-file convention.
#[must_use]
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}
