/*!
 * Policy Path Handling
 * Traversal rejection, normalization, and glob-list matching
 */

use std::path::{Component, Path, PathBuf};

/// Check for traversal components (`..`, `.`) in the raw path
///
/// Checked before normalization: a path that tries to traverse is rejected
/// outright rather than silently cleaned.
pub fn has_traversal(path: &str) -> bool {
    Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
}

/// Normalize a path without touching the filesystem
pub fn normalize(path: &str) -> PathBuf {
    path_clean::clean(path)
}

/// Resolve a path to the form matched against a policy's glob lists
///
/// Absolute paths must fall under `root_path` and are matched relative to
/// it; relative paths are matched as-is. Returns `None` when the path
/// escapes the root.
pub fn relative_to_root(path: &Path, root_path: &Path) -> Option<PathBuf> {
    if !path.is_absolute() {
        return Some(path.to_path_buf());
    }
    let root = path_clean::clean(root_path);
    path.strip_prefix(&root).ok().map(|p| p.to_path_buf())
}

/// Whether any pattern in the list matches the path
pub fn matches_any(path: &Path, patterns: &[String]) -> bool {
    let candidate = path.to_string_lossy();
    patterns.iter().any(|pattern| {
        glob::Pattern::new(pattern)
            .map(|compiled| compiled.matches(&candidate))
            .unwrap_or(false)
    })
}
