//! Persisted records and their storage keys

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::annotation::{Annotation, AnnotationStore};
use crate::core::util::hash_bytes;

/// Single-file "last viewed" pointer
pub const LAST_VIEWED_KEY: &str = "brief-last";

/// Annotations of the single implicit document
pub const SINGLE_DOC_KEY: &str = "brief-doc";

/// Folder-mode index
pub const FOLDER_INDEX_KEY: &str = "brief-folder-index";

/// Prefix of per-file records in folder mode
pub const FOLDER_FILE_PREFIX: &str = "brief-folder-file-";

/// Storage key of a folder file's record
pub fn folder_file_key(path: &str) -> String {
    format!("{}{}", FOLDER_FILE_PREFIX, hash_bytes(path.as_bytes()))
}

/// Which document the next load should restore in single-file mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastViewed {
    pub path: String,
    pub content: String,
    pub saved_at: DateTime<Utc>,
}

/// Folder-mode index: serialization order, annotated set and position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderIndex {
    /// Display name of the folder, distinct from any file path
    pub name: String,

    /// Every known file, in registration order
    pub files: Vec<String>,

    /// Files known to hold at least one annotation
    #[serde(default)]
    pub annotated: Vec<String>,

    /// Currently open file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,

    pub saved_at: DateTime<Utc>,
}

impl FolderIndex {
    pub fn contains(&self, path: &str) -> bool {
        self.files.iter().any(|f| f == path)
    }

    pub fn is_annotated(&self, path: &str) -> bool {
        self.annotated.iter().any(|f| f == path)
    }
}

/// One document's content plus its annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Absent for the single implicit document of an unnamed source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    /// Next id to hand out; ids are never reused within a document
    #[serde(default)]
    pub next_id: u64,
}

impl DocumentRecord {
    pub fn new(path: Option<&str>, content: &str, store: &AnnotationStore) -> Self {
        Self {
            path: path.map(str::to_string),
            content: content.to_string(),
            annotations: store.list().to_vec(),
            next_id: store.next_id(),
        }
    }

    pub fn to_store(&self) -> AnnotationStore {
        let mut store = AnnotationStore::from_annotations(self.annotations.clone());
        store.advance_next_id(self.next_id);
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annotation::AnnotationKind;

    #[test]
    fn test_folder_file_key_is_stable() {
        let key = folder_file_key("docs/a.md");
        assert!(key.starts_with(FOLDER_FILE_PREFIX));
        assert_eq!(key, folder_file_key("docs/a.md"));
        assert_ne!(key, folder_file_key("docs/b.md"));
    }

    #[test]
    fn test_document_record_keeps_id_counter() {
        let mut store = AnnotationStore::new();
        let a = store.create(AnnotationKind::Strike, "a", None).unwrap();
        let b = store.create(AnnotationKind::Strike, "b", None).unwrap();
        store.remove(a).unwrap();
        store.remove(b).unwrap();

        let record = DocumentRecord::new(Some("a.md"), "text", &store);
        let json = serde_json::to_string(&record).unwrap();
        let back: DocumentRecord = serde_json::from_str(&json).unwrap();

        let mut restored = back.to_store();
        let next = restored.create(AnnotationKind::Strike, "c", None).unwrap();
        assert_eq!(next.0, 3);
    }

    #[test]
    fn test_folder_index_lookups() {
        let index = FolderIndex {
            name: "Proj".to_string(),
            files: vec!["a.md".to_string(), "b.md".to_string()],
            annotated: vec!["a.md".to_string()],
            current: Some("a.md".to_string()),
            saved_at: Utc::now(),
        };
        assert!(index.contains("b.md"));
        assert!(!index.contains("c.md"));
        assert!(index.is_annotated("a.md"));
        assert!(!index.is_annotated("b.md"));
    }

    #[test]
    fn test_document_record_defaults() {
        let record: DocumentRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.path, None);
        assert!(record.annotations.is_empty());
        assert!(record.to_store().is_empty());
    }
}
