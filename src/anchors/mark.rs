//! Marker insertion and removal
//!
//! Marks a selection by isolating each text slice into its own node and
//! wrapping it in an inline marker:
//! <span class="ann-strikethrough" data-ann-id="ann-1">...</span>
//! <span class="ann-comment" data-ann-id="ann-2" title="note">...</span>
//!
//! One annotation may own several markers when its selection crosses element
//! boundaries; they all share the same `data-ann-id`.

use tracing::debug;

use crate::anchors::select::TextSlice;
use crate::core::annotation::{AnnotationId, AnnotationKind};
use crate::dom::node::{Document, NodeId};
use crate::error::DomError;

/// Tag used for marker elements
pub const MARKER_TAG: &str = "span";

/// Attribute carrying the annotation id on every marker
pub const MARKER_ID_ATTR: &str = "data-ann-id";

/// What to stamp on the markers of one annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkSpec {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    pub comment: Option<String>,
}

impl MarkSpec {
    pub fn strike(id: AnnotationId) -> Self {
        Self {
            id,
            kind: AnnotationKind::Strike,
            comment: None,
        }
    }

    pub fn comment(id: AnnotationId, comment: impl Into<String>) -> Self {
        Self {
            id,
            kind: AnnotationKind::Comment,
            comment: Some(comment.into()),
        }
    }
}

/// Wrap every slice in a marker element; returns the markers created
pub fn mark(doc: &mut Document, slices: &[TextSlice], spec: &MarkSpec) -> Result<Vec<NodeId>, DomError> {
    let id_value = spec.id.to_string();
    let mut markers = Vec::with_capacity(slices.len());

    for slice in slices {
        let len = doc.node_len(slice.node);
        if slice.start >= slice.end || slice.end > len {
            return Err(DomError::OffsetOutOfBounds {
                node: slice.node,
                offset: slice.end,
                len,
            });
        }

        let mut target = slice.node;
        let mut target_end = slice.end;
        if slice.start > 0 {
            target = doc.split_text(target, slice.start)?;
            target_end = slice.end - slice.start;
        }
        if target_end < doc.node_len(target) {
            doc.split_text(target, target_end)?;
        }

        let parent = doc.parent(target).ok_or(DomError::Detached(target))?;
        let marker = doc.create_element(MARKER_TAG);
        doc.set_attr(marker, "class", spec.kind.marker_class());
        doc.set_attr(marker, MARKER_ID_ATTR, &id_value);
        if let Some(comment) = &spec.comment {
            doc.set_attr(marker, "title", comment);
        }

        doc.insert_before(parent, marker, target)?;
        doc.append_child(marker, target);
        markers.push(marker);
    }

    debug!(id = %spec.id, markers = markers.len(), "marked selection");
    Ok(markers)
}

/// Markers of annotation `id` under `root`, in document order
pub fn markers_for(doc: &Document, root: NodeId, id: AnnotationId) -> Vec<NodeId> {
    doc.find_by_attr(root, MARKER_ID_ATTR, &id.to_string())
}

/// Unwrap every marker of `id`; returns how many were removed (zero is fine)
pub fn unmark(doc: &mut Document, root: NodeId, id: AnnotationId) -> Result<usize, DomError> {
    let markers = markers_for(doc, root, id);
    for marker in &markers {
        unwrap_marker(doc, *marker)?;
    }
    if !markers.is_empty() {
        debug!(id = %id, markers = markers.len(), "removed markers");
    }
    Ok(markers.len())
}

/// Unwrap every marker under `root`, whatever annotation it belongs to
pub fn unmark_all(doc: &mut Document, root: NodeId) -> Result<usize, DomError> {
    let markers = doc.find_with_attr(root, MARKER_ID_ATTR);
    // Innermost first so nested markers unwrap cleanly
    for marker in markers.iter().rev() {
        unwrap_marker(doc, *marker)?;
    }
    Ok(markers.len())
}

/// Update the tooltip of every marker of `id`
pub fn set_comment(doc: &mut Document, root: NodeId, id: AnnotationId, comment: &str) -> usize {
    let markers = markers_for(doc, root, id);
    for marker in &markers {
        doc.set_attr(*marker, "title", comment);
    }
    markers.len()
}

/// Distinct annotation ids that currently have markers under `root`
pub fn marker_ids(doc: &Document, root: NodeId) -> Vec<AnnotationId> {
    let mut ids: Vec<AnnotationId> = Vec::new();
    for marker in doc.find_with_attr(root, MARKER_ID_ATTR) {
        if let Some(id) = doc
            .attr(marker, MARKER_ID_ATTR)
            .and_then(|v| v.parse::<AnnotationId>().ok())
        {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

fn unwrap_marker(doc: &mut Document, marker: NodeId) -> Result<(), DomError> {
    let parent = doc.parent(marker).ok_or(DomError::Detached(marker))?;
    for child in doc.children(marker).to_vec() {
        doc.insert_before(parent, child, marker)?;
    }
    doc.detach(marker);
    doc.normalize(parent);
    Ok(())
}
