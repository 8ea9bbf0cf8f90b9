//! Error types for the annotation engine
//!
//! The engine reports typed errors; the CLI wraps them in `anyhow` with context.

use thiserror::Error;

use crate::core::annotation::AnnotationId;
use crate::dom::node::NodeId;

/// Errors raised while mutating the document tree
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("node {0:?} is not a text node")]
    NotText(NodeId),

    #[error("offset {offset} is out of bounds for node {node:?} (length {len})")]
    OffsetOutOfBounds {
        node: NodeId,
        offset: usize,
        len: usize,
    },

    #[error("node {0:?} has no parent")]
    Detached(NodeId),
}

/// Errors raised by the key-value storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("quota exceeded writing '{key}' ({needed} bytes, limit {limit})")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },
}

/// Errors surfaced by the annotation contract
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("annotation {0} not found")]
    NotFound(AnnotationId),

    #[error("annotation {0} is not a comment")]
    NotAComment(AnnotationId),

    #[error("comment text is empty")]
    EmptyComment,

    #[error("no document is open")]
    NoDocument,

    #[error("not in folder mode")]
    NotInFolderMode,

    #[error("file '{0}' is not part of the open folder")]
    UnknownFile(String),

    #[error("there are no annotations to export")]
    NothingToExport,

    #[error("failed to write to the clipboard: {0}")]
    Clipboard(#[source] std::io::Error),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = AnnotateError::NotFound(AnnotationId(7));
        assert_eq!(err.to_string(), "annotation ann-7 not found");
    }

    #[test]
    fn test_quota_message() {
        let err = StorageError::QuotaExceeded {
            key: "brief-doc".to_string(),
            needed: 10,
            limit: 5,
        };
        assert!(err.to_string().contains("brief-doc"));
    }
}
