//! Annotation records and the per-document annotation store

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnnotateError;

/// Identity of an annotation, rendered as `ann-N`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ann-{}", self.0)
    }
}

impl FromStr for AnnotationId {
    type Err = String;

    /// Accepts both `ann-3` and `3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches("ann-");
        digits
            .parse::<u64>()
            .map(AnnotationId)
            .map_err(|_| format!("Invalid annotation id: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Strike,
    Comment,
}

impl AnnotationKind {
    /// CSS class carried by the marker element
    pub fn marker_class(self) -> &'static str {
        match self {
            AnnotationKind::Strike => "ann-strikethrough",
            AnnotationKind::Comment => "ann-comment",
        }
    }
}

/// A single strike or comment bound to the quoted text it was made on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: AnnotationKind,

    /// Exact text that was selected; never changes after creation
    pub quoted_text: String,

    /// Present iff `kind` is `Comment`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    pub created_order: u64,
}

/// Ordered annotations of one logical document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    next_id: u64,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            annotations: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a store from persisted records; new ids continue past the highest one
    pub fn from_annotations(annotations: Vec<Annotation>) -> Self {
        let next_id = annotations
            .iter()
            .map(|a| a.id.0.max(a.created_order))
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            annotations,
            next_id,
        }
    }

    /// Id the next `create` will hand out
    pub fn next_id(&self) -> u64 {
        self.next_id.max(1)
    }

    /// Make sure ids below `next` are never handed out
    pub fn advance_next_id(&mut self, next: u64) {
        self.next_id = self.next_id.max(next);
    }

    /// Record a new annotation and return its id
    pub fn create(
        &mut self,
        kind: AnnotationKind,
        quoted_text: impl Into<String>,
        comment: Option<String>,
    ) -> Result<AnnotationId, AnnotateError> {
        let comment = match kind {
            AnnotationKind::Comment => match comment {
                Some(text) if !text.trim().is_empty() => Some(text),
                _ => return Err(AnnotateError::EmptyComment),
            },
            AnnotationKind::Strike => None,
        };

        let id = AnnotationId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.annotations.push(Annotation {
            id,
            kind,
            quoted_text: quoted_text.into(),
            comment,
            created_order: id.0,
        });
        Ok(id)
    }

    /// Replace the comment text of a comment annotation
    pub fn update(&mut self, id: AnnotationId, comment: impl Into<String>) -> Result<(), AnnotateError> {
        let comment = comment.into();
        if comment.trim().is_empty() {
            return Err(AnnotateError::EmptyComment);
        }

        let annotation = self
            .annotations
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AnnotateError::NotFound(id))?;

        if annotation.kind != AnnotationKind::Comment {
            return Err(AnnotateError::NotAComment(id));
        }

        annotation.comment = Some(comment);
        Ok(())
    }

    pub fn remove(&mut self, id: AnnotationId) -> Result<Annotation, AnnotateError> {
        let index = self
            .annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or(AnnotateError::NotFound(id))?;
        Ok(self.annotations.remove(index))
    }

    /// Drop every annotation; the id counter keeps running
    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn list(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
