//! Unified Result Model
//!
//! Listing commands (`list`, `files`, `status`) map their output to this model
//! before rendering, so every output format sees the same shape.

use serde::{Deserialize, Serialize};

use crate::core::annotation::{Annotation, AnnotationKind};

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Strike,
    Comment,
    File,
    Status,
    Error,
}

impl From<AnnotationKind> for Kind {
    fn from(kind: AnnotationKind) -> Self {
        match kind {
            AnnotationKind::Strike => Kind::Strike,
            AnnotationKind::Comment => Kind::Comment,
        }
    }
}

/// Metadata for a result item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    /// Number of annotations this item stands for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// Whether the item is the currently open document
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub current: bool,
}

/// Error information for a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefError {
    pub code: String,
    pub message: String,
}

impl BriefError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The unified result item that all listing commands produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub kind: Kind,

    /// Annotation id (`ann-N`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Document path, '/' separated; absent for the single implicit document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Quoted text of an annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Structured payload (status reports)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BriefError>,
}

impl ResultItem {
    fn empty(kind: Kind) -> Self {
        Self {
            kind,
            id: None,
            path: None,
            excerpt: None,
            comment: None,
            data: None,
            meta: Meta::default(),
            errors: Vec::new(),
        }
    }

    /// An annotation of the document at `path`
    pub fn annotation(path: Option<&str>, annotation: &Annotation) -> Self {
        Self {
            id: Some(annotation.id.to_string()),
            path: path.map(str::to_string),
            excerpt: Some(annotation.quoted_text.clone()),
            comment: annotation.comment.clone(),
            ..Self::empty(annotation.kind.into())
        }
    }

    /// A folder file
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::empty(Kind::File)
        }
    }

    /// A status report carrying a structured payload
    pub fn status(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::empty(Kind::Status)
        }
    }

    pub fn error(error: BriefError) -> Self {
        Self {
            errors: vec![error],
            ..Self::empty(Kind::Error)
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annotation::AnnotationId;

    fn comment() -> Annotation {
        Annotation {
            id: AnnotationId(2),
            kind: AnnotationKind::Comment,
            quoted_text: "First".to_string(),
            comment: Some("Check this".to_string()),
            created_order: 2,
        }
    }

    #[test]
    fn test_result_item_annotation() {
        let item = ResultItem::annotation(Some("a.md"), &comment());
        assert_eq!(item.kind, Kind::Comment);
        assert_eq!(item.id.as_deref(), Some("ann-2"));
        assert_eq!(item.path.as_deref(), Some("a.md"));
        assert_eq!(item.excerpt.as_deref(), Some("First"));
        assert_eq!(item.comment.as_deref(), Some("Check this"));
    }

    #[test]
    fn test_result_item_file() {
        let item = ResultItem::file("docs/a.md").with_meta(Meta {
            count: Some(3),
            current: true,
        });
        assert_eq!(item.kind, Kind::File);
        assert_eq!(item.meta.count, Some(3));
        assert!(item.meta.current);
    }

    #[test]
    fn test_result_item_error() {
        let item = ResultItem::error(BriefError::new("NOT_FOUND", "annotation ann-9 not found"));
        assert_eq!(item.kind, Kind::Error);
        assert_eq!(item.errors.len(), 1);
        assert_eq!(item.errors[0].code, "NOT_FOUND");
    }

    #[test]
    fn test_kind_serialization() {
        let item = ResultItem::annotation(None, &comment());
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"kind\":\"comment\""));
        assert!(!json.contains("\"path\""));
        assert!(!json.contains("\"current\""));
    }

    #[test]
    fn test_status_data_is_embedded() {
        let item = ResultItem::status(serde_json::json!({ "mode": "folder", "count": 2 }));
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"data\":{"));
        assert!(json.contains("\"mode\":\"folder\""));
    }

    #[test]
    fn test_result_set_from_iter() {
        let set: ResultSet = vec![ResultItem::file("a.md"), ResultItem::file("b.md")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_result_item_deserialization() {
        let json = r#"{"kind":"strike","id":"ann-1","excerpt":"some text","meta":{}}"#;
        let item: ResultItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, Kind::Strike);
        assert_eq!(item.excerpt.as_deref(), Some("some text"));
    }
}
