//! Annotation session - the contract the UI talks to
//!
//! A `Workspace` owns the persistence layer, the active mode and the currently
//! rendered document with its annotation store. Navigation is strictly
//! sequential: unmark the outgoing document, swap content, anchor the incoming
//! one. Storage writes follow DOM changes and never undo them.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::anchors::mark::{self, MarkSpec};
use crate::anchors::reanchor::reanchor;
use crate::anchors::text_index::TextIndex;
use crate::backends::clipboard::Clipboard;
use crate::cache::kv::KeyValueStore;
use crate::cache::store::{Mode, Persistence};
use crate::core::annotation::{Annotation, AnnotationId, AnnotationKind, AnnotationStore};
use crate::core::paths::display_name;
use crate::dom::html::inner_html;
use crate::dom::render::{render_markdown, RenderedDocument};
use crate::error::AnnotateError;
use crate::flows::export::{format_folder, format_single};
use crate::flows::selection::{capture_selection, Selection, Toast, COPIED_MESSAGE};

/// The document currently on screen
#[derive(Debug, Clone)]
pub struct OpenDocument {
    /// Storage identity: the folder path, or `None` for the single document
    pub key: Option<String>,
    pub filename: String,
    pub content: String,
    pub rendered: RenderedDocument,
    pub store: AnnotationStore,
}

/// Outcome of loading a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub path: String,
    pub anchored: usize,
    pub dropped: usize,
}

/// One folder file as shown in the file list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub path: String,
    pub annotated: bool,
    pub count: usize,
    pub current: bool,
}

pub struct Workspace<S: KeyValueStore> {
    persistence: Persistence<S>,
    mode: Option<Mode>,
    current: Option<OpenDocument>,
    folder_sources: BTreeMap<String, String>,
    toast: Toast,
}

impl<S: KeyValueStore> Workspace<S> {
    pub fn new(persistence: Persistence<S>) -> Self {
        Self {
            persistence,
            mode: None,
            current: None,
            folder_sources: BTreeMap::new(),
            toast: Toast::default(),
        }
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn current(&self) -> Option<&OpenDocument> {
        self.current.as_ref()
    }

    pub fn toast(&self) -> &Toast {
        &self.toast
    }

    /// Bring back whatever was open last time (the "reload")
    pub fn restore(&mut self) -> Result<Option<LoadReport>, AnnotateError> {
        self.mode = self.persistence.mode()?;
        match self.mode {
            Some(Mode::Single) => {
                let Some(last) = self.persistence.last_viewed()? else {
                    return Ok(None);
                };
                let filename = display_name(Path::new(&last.path));
                self.on_document_loaded(None, &filename, &last.content).map(Some)
            }
            Some(Mode::Folder) => {
                let Some(index) = self.persistence.folder_index()? else {
                    return Ok(None);
                };
                let target = index.current.clone().or_else(|| index.files.first().cloned());
                match target {
                    Some(path) => {
                        let content = self.folder_source(&path)?;
                        self.on_document_loaded(Some(&path), &path, &content).map(Some)
                    }
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    /// Open one markdown file in single-file mode
    pub fn open_file(&mut self, path: &str, content: &str) -> Result<LoadReport, AnnotateError> {
        self.on_document_will_unload()?;
        if let Err(e) = self.persistence.switch_to_single_file(path, content) {
            warn!(error = %e, "failed to persist single-file mode");
        }
        self.mode = Some(Mode::Single);
        self.folder_sources.clear();

        let filename = display_name(Path::new(path));
        self.on_document_loaded(None, &filename, content)
    }

    /// Open a set of files in folder mode and show `start` (or the first file)
    pub fn open_folder(
        &mut self,
        name: &str,
        files: &[(String, String)],
        start: Option<&str>,
    ) -> Result<Option<LoadReport>, AnnotateError> {
        let paths: Vec<String> = files.iter().map(|(path, _)| path.clone()).collect();
        if let Some(start) = start {
            if !paths.iter().any(|p| p == start) {
                return Err(AnnotateError::UnknownFile(start.to_string()));
            }
        }
        self.on_document_will_unload()?;

        if let Err(e) = self.persistence.switch_to_folder(name, &paths) {
            warn!(error = %e, "failed to persist folder mode");
        }
        self.mode = Some(Mode::Folder);
        self.folder_sources = files.iter().cloned().collect();

        // Refresh stored content, keeping annotations the index preserved
        for (path, content) in files {
            let store = self.persistence.load_store(Some(path));
            if let Err(e) = self.persistence.save_document(Some(path), content, &store) {
                warn!(path = %path, error = %e, "failed to persist folder file");
            }
        }

        let target = start.map(str::to_string).or_else(|| paths.first().cloned());
        match target {
            Some(path) => self.load_folder_file(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Switch to another file of the open folder
    pub fn navigate(&mut self, path: &str) -> Result<LoadReport, AnnotateError> {
        if self.mode != Some(Mode::Folder) {
            return Err(AnnotateError::NotInFolderMode);
        }
        let known = self
            .persistence
            .folder_index()?
            .is_some_and(|index| index.contains(path));
        if !known && !self.folder_sources.contains_key(path) {
            return Err(AnnotateError::UnknownFile(path.to_string()));
        }

        self.on_document_will_unload()?;
        self.load_folder_file(path)
    }

    fn load_folder_file(&mut self, path: &str) -> Result<LoadReport, AnnotateError> {
        let content = self.folder_source(path)?;
        let report = self.on_document_loaded(Some(path), path, &content)?;
        if let Err(e) = self.persistence.set_current_folder_file(path) {
            warn!(path, error = %e, "failed to persist navigation");
        }
        Ok(report)
    }

    fn folder_source(&self, path: &str) -> Result<String, AnnotateError> {
        if let Some(content) = self.folder_sources.get(path) {
            return Ok(content.clone());
        }
        self.persistence
            .load_document(Some(path))?
            .map(|record| record.content)
            .ok_or_else(|| AnnotateError::UnknownFile(path.to_string()))
    }

    /// Remove the outgoing document's markers and let it go
    pub fn on_document_will_unload(&mut self) -> Result<(), AnnotateError> {
        if let Some(mut doc) = self.current.take() {
            let root = doc.rendered.root();
            let removed = mark::unmark_all(&mut doc.rendered.doc, root)?;
            debug!(document = %doc.filename, markers = removed, "unloaded document");
        }
        Ok(())
    }

    /// Render `content`, then re-apply its stored annotations
    pub fn on_document_loaded(
        &mut self,
        key: Option<&str>,
        filename: &str,
        content: &str,
    ) -> Result<LoadReport, AnnotateError> {
        let mut rendered = render_markdown(content, filename);
        let stored = self.persistence.load_store(key);
        let root = rendered.root();
        let outcome = reanchor(&mut rendered.doc, root, &stored)?;

        let report = LoadReport {
            path: filename.to_string(),
            anchored: outcome.anchored,
            dropped: outcome.dropped.len(),
        };

        self.current = Some(OpenDocument {
            key: key.map(str::to_string),
            filename: filename.to_string(),
            content: content.to_string(),
            rendered,
            store: outcome.store,
        });

        if report.dropped > 0 {
            self.persist();
        }
        Ok(report)
    }

    fn current_mut(&mut self) -> Result<&mut OpenDocument, AnnotateError> {
        self.current.as_mut().ok_or(AnnotateError::NoDocument)
    }

    fn current_ref(&self) -> Result<&OpenDocument, AnnotateError> {
        self.current.as_ref().ok_or(AnnotateError::NoDocument)
    }

    /// Selection over the `nth` (0-based) occurrence of `needle`
    pub fn select_text(&self, needle: &str, nth: usize) -> Result<Option<Selection>, AnnotateError> {
        let doc = self.current_ref()?;
        let root = doc.rendered.root();
        let index = TextIndex::build(&doc.rendered.doc, root);
        Ok(index
            .find_nth(needle, nth)
            .and_then(|(start, end)| index.range_for(&doc.rendered.doc, start, end))
            .and_then(|range| capture_selection(&doc.rendered.doc, &range)))
    }

    /// Selection over text offsets `[start, end)` (chars)
    pub fn select_offsets(&self, start: usize, end: usize) -> Result<Option<Selection>, AnnotateError> {
        let doc = self.current_ref()?;
        let index = TextIndex::build(&doc.rendered.doc, doc.rendered.root());
        Ok(index
            .range_for(&doc.rendered.doc, start, end)
            .and_then(|range| capture_selection(&doc.rendered.doc, &range)))
    }

    /// Mark `selection` and record it; `None` when the selection is empty
    pub fn create(
        &mut self,
        kind: AnnotationKind,
        selection: &Selection,
        comment: Option<&str>,
    ) -> Result<Option<AnnotationId>, AnnotateError> {
        if selection.slices.is_empty() {
            return Ok(None);
        }
        let comment = match kind {
            AnnotationKind::Comment => Some(trimmed_comment(comment)?),
            AnnotationKind::Strike => None,
        };

        let doc = self.current_mut()?;
        let id = doc
            .store
            .create(kind, selection.text.clone(), comment.clone())?;
        let spec = MarkSpec { id, kind, comment };
        if let Err(e) = mark::mark(&mut doc.rendered.doc, &selection.slices, &spec) {
            // Earlier slices may already carry markers
            let root = doc.rendered.root();
            mark::unmark(&mut doc.rendered.doc, root, id)?;
            doc.store.remove(id)?;
            return Err(e.into());
        }

        debug!(id = %id, quoted = %selection.text, "created annotation");
        self.persist();
        Ok(Some(id))
    }

    /// Change a comment's text and every tooltip showing it
    pub fn edit(&mut self, id: AnnotationId, comment: &str) -> Result<(), AnnotateError> {
        let comment = trimmed_comment(Some(comment))?;
        let doc = self.current_mut()?;
        doc.store.update(id, comment.clone())?;
        let root = doc.rendered.root();
        mark::set_comment(&mut doc.rendered.doc, root, id, &comment);
        self.persist();
        Ok(())
    }

    /// Drop an annotation together with all of its markers
    pub fn remove(&mut self, id: AnnotationId) -> Result<Annotation, AnnotateError> {
        let doc = self.current_mut()?;
        let removed = doc.store.remove(id)?;
        let root = doc.rendered.root();
        mark::unmark(&mut doc.rendered.doc, root, id)?;
        self.persist();
        Ok(removed)
    }

    /// Remove every annotation of the current document
    pub fn clear_all(&mut self) -> Result<usize, AnnotateError> {
        let doc = self.current_mut()?;
        let count = doc.store.len();
        let root = doc.rendered.root();
        mark::unmark_all(&mut doc.rendered.doc, root)?;
        doc.store.clear();
        self.persist();
        Ok(count)
    }

    /// Annotations of the current document in creation order
    pub fn annotations(&self) -> &[Annotation] {
        self.current.as_ref().map(|d| d.store.list()).unwrap_or(&[])
    }

    /// Every store taking part in an export, the live one replacing its stored copy
    pub fn folder_stores(&self) -> Result<Vec<(String, AnnotationStore)>, AnnotateError> {
        let mut stores = self.persistence.folder_stores()?;
        if let Some(OpenDocument {
            key: Some(path),
            store,
            ..
        }) = &self.current
        {
            if let Some(slot) = stores.iter_mut().find(|(p, _)| p == path) {
                slot.1 = store.clone();
            }
        }
        Ok(stores)
    }

    /// Folder files flagged as annotated in the index, the open one excluded
    fn other_annotated_files(&self) -> Result<Vec<String>, AnnotateError> {
        let current = self.current.as_ref().and_then(|d| d.key.as_deref());
        Ok(self
            .persistence
            .folder_index()?
            .map(|index| {
                index
                    .annotated
                    .into_iter()
                    .filter(|path| Some(path.as_str()) != current)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Total annotations that an export would contain
    ///
    /// In folder mode only files the index flags as annotated are read.
    pub fn annotation_count(&self) -> Result<usize, AnnotateError> {
        let live = self.annotations().len();
        match self.mode {
            Some(Mode::Folder) => Ok(live
                + self
                    .other_annotated_files()?
                    .iter()
                    .map(|path| self.persistence.load_store(Some(path)).len())
                    .sum::<usize>()),
            _ => Ok(live),
        }
    }

    /// Whether export and clear are available; answered from the folder index
    pub fn has_annotations(&self) -> Result<bool, AnnotateError> {
        if !self.annotations().is_empty() {
            return Ok(true);
        }
        match self.mode {
            Some(Mode::Folder) => Ok(!self.other_annotated_files()?.is_empty()),
            _ => Ok(false),
        }
    }

    /// The canonical export text
    pub fn export_text(&self) -> Result<String, AnnotateError> {
        match self.mode {
            Some(Mode::Folder) => {
                let name = self
                    .persistence
                    .folder_index()?
                    .map(|index| index.name)
                    .ok_or(AnnotateError::NotInFolderMode)?;
                format_folder(&name, &self.folder_stores()?)
            }
            _ => {
                let doc = self.current_ref()?;
                format_single(&doc.rendered.title, &doc.filename, &doc.store)
            }
        }
    }

    /// Export to the clipboard and raise the confirmation toast
    pub fn copy_export(&mut self, clipboard: &mut dyn Clipboard, now: Instant) -> Result<String, AnnotateError> {
        let text = self.export_text()?;
        clipboard.write_text(&text).map_err(AnnotateError::Clipboard)?;
        self.toast.show(COPIED_MESSAGE, now);
        Ok(text)
    }

    /// Rendered HTML of the current document, markers included
    pub fn html(&self) -> Result<String, AnnotateError> {
        let doc = self.current_ref()?;
        Ok(inner_html(&doc.rendered.doc, doc.rendered.root()))
    }

    /// Folder files with their annotation state
    pub fn files_status(&self) -> Result<Vec<FileStatus>, AnnotateError> {
        if self.mode != Some(Mode::Folder) {
            return Err(AnnotateError::NotInFolderMode);
        }
        let index = self.persistence.folder_index()?;
        let current = self.current.as_ref().and_then(|d| d.key.clone());
        Ok(self
            .folder_stores()?
            .into_iter()
            .map(|(path, store)| FileStatus {
                annotated: !store.is_empty()
                    || index.as_ref().is_some_and(|i| i.is_annotated(&path)),
                count: store.len(),
                current: current.as_deref() == Some(path.as_str()),
                path,
            })
            .collect())
    }

    pub fn folder_name(&self) -> Result<Option<String>, AnnotateError> {
        Ok(self.persistence.folder_index()?.map(|index| index.name))
    }

    /// Write the current store; failures are logged and never roll back
    fn persist(&mut self) {
        let Some(doc) = self.current.as_ref() else {
            return;
        };
        if let Err(e) = self
            .persistence
            .save_document(doc.key.as_deref(), &doc.content, &doc.store)
        {
            warn!(document = %doc.filename, error = %e, "failed to persist annotations");
        }

        if let Some(path) = doc.key.as_deref() {
            let result = if doc.store.is_empty() {
                self.persistence.unmark_folder_file_annotated(path)
            } else {
                self.persistence.mark_folder_file_annotated(path)
            };
            if let Err(e) = result {
                warn!(path, error = %e, "failed to update folder index");
            }
        }
    }
}

fn trimmed_comment(comment: Option<&str>) -> Result<String, AnnotateError> {
    match comment.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(AnnotateError::EmptyComment),
    }
}
