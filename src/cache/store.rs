//! Persistence of annotation sets, the folder index and the last-viewed pointer
//!
//! Single-file and folder mode are mutually exclusive persisted states: each
//! `switch_to_*` transition erases what the other mode left behind.

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::kv::KeyValueStore;
use crate::cache::meta::{
    folder_file_key, DocumentRecord, FolderIndex, LastViewed, FOLDER_FILE_PREFIX,
    FOLDER_INDEX_KEY, LAST_VIEWED_KEY, SINGLE_DOC_KEY,
};
use crate::core::annotation::AnnotationStore;
use crate::core::util::now;
use crate::error::StorageError;

/// Which persisted state is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Single,
    Folder,
}

/// Typed access to the persisted state over any key-value backend
#[derive(Debug, Clone)]
pub struct Persistence<S> {
    kv: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    /// Active mode, if any document was ever opened
    pub fn mode(&self) -> Result<Option<Mode>, StorageError> {
        if self.kv.get(FOLDER_INDEX_KEY)?.is_some() {
            return Ok(Some(Mode::Folder));
        }
        if self.kv.get(LAST_VIEWED_KEY)?.is_some() {
            return Ok(Some(Mode::Single));
        }
        Ok(None)
    }

    fn document_key(path: Option<&str>) -> String {
        match path {
            Some(path) => folder_file_key(path),
            None => SINGLE_DOC_KEY.to_string(),
        }
    }

    /// Persist a document's annotations; `None` is the single implicit document
    pub fn save_document(
        &mut self,
        path: Option<&str>,
        content: &str,
        store: &AnnotationStore,
    ) -> Result<(), StorageError> {
        let record = DocumentRecord::new(path, content, store);
        self.kv.set_json(&Self::document_key(path), &record)
    }

    /// The stored record of a document, if any
    pub fn load_document(&self, path: Option<&str>) -> Result<Option<DocumentRecord>, StorageError> {
        self.kv.get_json(&Self::document_key(path))
    }

    /// The stored annotations of a document; empty when missing or unreadable
    pub fn load_store(&self, path: Option<&str>) -> AnnotationStore {
        match self.load_document(path) {
            Ok(Some(record)) => record.to_store(),
            Ok(None) => AnnotationStore::new(),
            Err(e) => {
                warn!(path = path.unwrap_or("<single>"), error = %e, "unreadable annotation record, starting empty");
                AnnotationStore::new()
            }
        }
    }

    /// Enter folder mode over `files`, erasing the single-file pointer
    ///
    /// Re-opening a folder with the same name keeps the records of files that
    /// are still present; any other folder starts clean.
    pub fn switch_to_folder(&mut self, name: &str, files: &[String]) -> Result<FolderIndex, StorageError> {
        self.kv.remove(LAST_VIEWED_KEY)?;
        self.kv.remove(SINGLE_DOC_KEY)?;

        let previous: Option<FolderIndex> = self.kv.get_json(FOLDER_INDEX_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "unreadable folder index, replacing it");
            None
        });
        let same_folder = previous.as_ref().is_some_and(|p| p.name == name);

        let keep: Vec<String> = if same_folder {
            files.iter().map(|f| folder_file_key(f)).collect()
        } else {
            Vec::new()
        };
        self.remove_folder_files_except(&keep)?;

        let annotated = match previous {
            Some(p) if same_folder => p
                .annotated
                .into_iter()
                .filter(|path| files.contains(path))
                .collect(),
            _ => Vec::new(),
        };

        let index = FolderIndex {
            name: name.to_string(),
            files: files.to_vec(),
            annotated,
            current: None,
            saved_at: now(),
        };
        self.kv.set_json(FOLDER_INDEX_KEY, &index)?;
        info!(folder = name, files = files.len(), reopened = same_folder, "switched to folder mode");
        Ok(index)
    }

    /// Enter single-file mode, erasing the folder index and every folder record
    ///
    /// Documents are identified by path: re-opening the same path keeps its
    /// annotations even when the content changed (anchoring drops what no
    /// longer matches), while a different path starts from an empty store.
    pub fn switch_to_single_file(&mut self, path: &str, content: &str) -> Result<(), StorageError> {
        self.kv.remove(FOLDER_INDEX_KEY)?;
        self.remove_folder_files_except(&[])?;

        let previous: Option<LastViewed> = self.kv.get_json(LAST_VIEWED_KEY).unwrap_or(None);
        let same_document = previous
            .as_ref()
            .is_some_and(|p| p.path == path);
        if !same_document {
            self.kv.remove(SINGLE_DOC_KEY)?;
        }

        let pointer = LastViewed {
            path: path.to_string(),
            content: content.to_string(),
            saved_at: now(),
        };
        self.kv.set_json(LAST_VIEWED_KEY, &pointer)?;
        info!(path, same_document, "switched to single-file mode");
        Ok(())
    }

    /// Record the open folder file; returns false outside folder mode
    pub fn set_current_folder_file(&mut self, path: &str) -> Result<bool, StorageError> {
        self.update_index(|index| index.current = Some(path.to_string()))
    }

    /// Add `path` to the annotated set; returns false outside folder mode
    pub fn mark_folder_file_annotated(&mut self, path: &str) -> Result<bool, StorageError> {
        self.update_index(|index| {
            if !index.is_annotated(path) {
                index.annotated.push(path.to_string());
            }
        })
    }

    /// Remove `path` from the annotated set; returns false outside folder mode
    pub fn unmark_folder_file_annotated(&mut self, path: &str) -> Result<bool, StorageError> {
        self.update_index(|index| index.annotated.retain(|p| p != path))
    }

    pub fn folder_index(&self) -> Result<Option<FolderIndex>, StorageError> {
        self.kv.get_json(FOLDER_INDEX_KEY)
    }

    pub fn last_viewed(&self) -> Result<Option<LastViewed>, StorageError> {
        self.kv.get_json(LAST_VIEWED_KEY)
    }

    /// Annotation stores of every folder file, in the index's order
    pub fn folder_stores(&self) -> Result<Vec<(String, AnnotationStore)>, StorageError> {
        let Some(index) = self.folder_index()? else {
            return Ok(Vec::new());
        };
        Ok(index
            .files
            .iter()
            .map(|path| (path.clone(), self.load_store(Some(path))))
            .collect())
    }

    fn update_index(&mut self, change: impl FnOnce(&mut FolderIndex)) -> Result<bool, StorageError> {
        let Some(mut index) = self.folder_index()? else {
            return Ok(false);
        };
        change(&mut index);
        index.saved_at = now();
        self.kv.set_json(FOLDER_INDEX_KEY, &index)?;
        Ok(true)
    }

    fn remove_folder_files_except(&mut self, keep: &[String]) -> Result<(), StorageError> {
        for key in self.kv.keys()? {
            if key.starts_with(FOLDER_FILE_PREFIX) && !keep.contains(&key) {
                self.kv.remove(&key)?;
            }
        }
        Ok(())
    }
}
