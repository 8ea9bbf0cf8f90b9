//! Command handlers - one `run_*` per CLI subcommand
//!
//! Each handler drives the workspace and returns the `ResultSet` the CLI prints.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::backends::clipboard::Clipboard;
use crate::backends::scan::read_markdown_folder;
use crate::cache::kv::KeyValueStore;
use crate::cache::store::Mode;
use crate::core::annotation::{AnnotationId, AnnotationKind};
use crate::core::model::{BriefError, Meta, ResultItem, ResultSet};
use crate::core::paths::{display_name, make_relative, normalize_path};
use crate::flows::selection::Selection;
use crate::flows::session::{LoadReport, Workspace};

/// How the user points at the text to annotate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The `nth` (1-based) occurrence of a quote
    Quote { text: String, nth: usize },
    /// Character offsets `[start, end)` into the document text
    Span { start: usize, end: usize },
}

/// Parse `START:END` character offsets
pub fn parse_span(s: &str) -> Result<(usize, usize)> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid span '{}': expected START:END", s))?;
    let start: usize = start
        .trim()
        .parse()
        .with_context(|| format!("Invalid span start in '{}'", s))?;
    let end: usize = end
        .trim()
        .parse()
        .with_context(|| format!("Invalid span end in '{}'", s))?;
    if end <= start {
        bail!("Invalid span '{}': end must be greater than start", s);
    }
    Ok((start, end))
}

fn load_item(mode: Mode, report: &LoadReport) -> ResultItem {
    ResultItem::status(json!({
        "mode": mode,
        "document": report.path,
        "anchored": report.anchored,
        "dropped": report.dropped,
    }))
}

/// `open FILE`: single-file mode
pub fn run_open<S: KeyValueStore>(ws: &mut Workspace<S>, root: &Path, file: &Path) -> Result<ResultSet> {
    let full = root.join(file);
    let content = fs::read_to_string(&full)
        .with_context(|| format!("Failed to read {}", full.display()))?;
    let path = make_relative(&full, root).unwrap_or_else(|| normalize_path(file));

    let report = ws.open_file(&path, &content)?;
    Ok(std::iter::once(load_item(Mode::Single, &report)).collect())
}

/// `folder [DIR]`: folder mode over every markdown file below DIR
pub fn run_folder<S: KeyValueStore>(
    ws: &mut Workspace<S>,
    root: &Path,
    dir: Option<&Path>,
    name: Option<&str>,
    start: Option<&str>,
) -> Result<ResultSet> {
    let dir = dir.map(|d| root.join(d)).unwrap_or_else(|| root.to_path_buf());
    let files = read_markdown_folder(&dir)?;
    if files.is_empty() {
        bail!("No markdown files found under {}", dir.display());
    }

    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| display_name(&dir));
    let report = ws.open_folder(&name, &files, start)?;

    let mut result_set = ResultSet::new();
    result_set.push(ResultItem::status(json!({
        "mode": Mode::Folder,
        "folder": name,
        "files": files.len(),
    })));
    if let Some(report) = report {
        result_set.push(load_item(Mode::Folder, &report));
    }
    Ok(result_set)
}

/// `go PATH`: switch files within the folder
pub fn run_go<S: KeyValueStore>(ws: &mut Workspace<S>, path: &str) -> Result<ResultSet> {
    let report = ws.navigate(path)?;
    Ok(std::iter::once(load_item(Mode::Folder, &report)).collect())
}

fn select<S: KeyValueStore>(ws: &Workspace<S>, target: &Target) -> Result<Selection> {
    let selection = match target {
        Target::Quote { text, nth } => {
            if *nth == 0 {
                bail!("--nth counts from 1");
            }
            ws.select_text(text, nth - 1)?
                .ok_or_else(|| anyhow!("Text not found in the document: \"{}\" (occurrence {})", text, nth))?
        }
        Target::Span { start, end } => ws
            .select_offsets(*start, *end)?
            .ok_or_else(|| anyhow!("Span {}:{} selects no text", start, end))?,
    };
    Ok(selection)
}

fn current_path<S: KeyValueStore>(ws: &Workspace<S>) -> Option<String> {
    ws.current().and_then(|doc| doc.key.clone())
}

/// `strike` / `comment`: annotate the targeted text
pub fn run_annotate<S: KeyValueStore>(
    ws: &mut Workspace<S>,
    kind: AnnotationKind,
    target: &Target,
    note: Option<&str>,
) -> Result<ResultSet> {
    let selection = select(ws, target)?;
    let id = ws
        .create(kind, &selection, note)?
        .ok_or_else(|| anyhow!("Selection is empty"))?;

    let path = current_path(ws);
    let annotation = ws
        .annotations()
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| anyhow!("Annotation {} vanished after creation", id))?;
    Ok(std::iter::once(ResultItem::annotation(path.as_deref(), annotation)).collect())
}

/// `edit ID --note TEXT`
pub fn run_edit<S: KeyValueStore>(ws: &mut Workspace<S>, id: AnnotationId, note: &str) -> Result<ResultSet> {
    ws.edit(id, note)?;
    let path = current_path(ws);
    Ok(ws
        .annotations()
        .iter()
        .filter(|a| a.id == id)
        .map(|a| ResultItem::annotation(path.as_deref(), a))
        .collect())
}

/// `remove ID`
pub fn run_remove<S: KeyValueStore>(ws: &mut Workspace<S>, id: AnnotationId) -> Result<ResultSet> {
    let removed = ws.remove(id)?;
    let path = current_path(ws);
    Ok(std::iter::once(ResultItem::annotation(path.as_deref(), &removed)).collect())
}

/// `clear`
pub fn run_clear<S: KeyValueStore>(ws: &mut Workspace<S>) -> Result<ResultSet> {
    let removed = ws.clear_all()?;
    Ok(std::iter::once(ResultItem::status(json!({ "removed": removed }))).collect())
}

/// `list [--all]`: annotations of the open document, or of every folder file
pub fn run_list<S: KeyValueStore>(ws: &Workspace<S>, all: bool) -> Result<ResultSet> {
    if all && ws.mode() == Some(Mode::Folder) {
        let mut result_set = ResultSet::new();
        for (path, store) in ws.folder_stores()? {
            for annotation in store.list() {
                result_set.push(ResultItem::annotation(Some(&path), annotation));
            }
        }
        return Ok(result_set);
    }

    let path = current_path(ws);
    Ok(ws
        .annotations()
        .iter()
        .map(|a| ResultItem::annotation(path.as_deref(), a))
        .collect())
}

/// `files`: folder files with annotation counts
pub fn run_files<S: KeyValueStore>(ws: &Workspace<S>) -> Result<ResultSet> {
    Ok(ws
        .files_status()?
        .into_iter()
        .map(|file| {
            ResultItem::file(file.path).with_meta(Meta {
                count: Some(file.count),
                current: file.current,
            })
        })
        .collect())
}

/// `export`: write the change request to `clipboard`
pub fn run_export<S: KeyValueStore>(ws: &mut Workspace<S>, clipboard: &mut dyn Clipboard) -> Result<String> {
    let now = Instant::now();
    ws.copy_export(clipboard, now)
        .context("Failed to export annotations")?;
    Ok(ws.toast().visible(now).unwrap_or_default().to_string())
}

/// `show`: rendered HTML with markers
pub fn run_show<S: KeyValueStore>(ws: &Workspace<S>) -> Result<String> {
    Ok(ws.html()?)
}

/// `status`: mode, open document and counts
pub fn run_status<S: KeyValueStore>(ws: &Workspace<S>) -> Result<ResultSet> {
    let mut result_set = ResultSet::new();
    let mut data = json!({ "mode": ws.mode() });

    match ws.annotation_count() {
        Ok(count) => {
            data["annotations"] = json!(count);
            data["has_annotations"] = json!(count > 0);
        }
        Err(e) => result_set.push(ResultItem::error(BriefError::new("STORAGE", e.to_string()))),
    }
    if let Some(doc) = ws.current() {
        data["document"] = json!(doc.filename);
        data["title"] = json!(doc.rendered.title);
        data["document_annotations"] = json!(doc.store.len());
    }
    if let Some(name) = ws.folder_name()? {
        data["folder"] = json!(name);
    }

    result_set.push(ResultItem::status(data));
    Ok(result_set)
}
