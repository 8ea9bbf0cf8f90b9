//! Path normalization utilities
//!
//! Document paths are stored with '/' as separator and relative to the folder root.

use std::path::{Path, PathBuf};

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the root directory
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize_path)
}

/// Get the .brief store directory for a given root
pub fn store_dir(root: &Path) -> PathBuf {
    root.join(".brief")
}

/// File name of `path`, falling back to the whole path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| normalize_path(path))
}
