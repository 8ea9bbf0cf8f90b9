//! Markdown discovery for folder mode
//!
//! Uses the ignore crate so `.gitignore` and hidden directories are respected.

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::core::paths::make_relative;

/// Extensions opened as markdown documents
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|m| m.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Relative paths of every markdown file below `root`, sorted
pub fn scan_markdown(root: &Path) -> Result<Vec<String>> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) || !is_markdown(path) {
            continue;
        }

        if let Some(relative) = make_relative(path, root) {
            files.push(relative);
        }
    }

    files.sort();
    Ok(files)
}

/// Scan `root` and read every markdown file it holds
pub fn read_markdown_folder(root: &Path) -> Result<Vec<(String, String)>> {
    scan_markdown(root)?
        .into_iter()
        .map(|relative| {
            let content = fs::read_to_string(root.join(&relative))
                .with_context(|| format!("Failed to read {}", relative))?;
            Ok((relative, content))
        })
        .collect()
}
