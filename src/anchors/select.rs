//! Selection to text slices
//!
//! Turns a live range into the ordered `(text node, start, end)` pieces it
//! covers. Pure: the document is never touched.

use crate::dom::node::{Document, NodeId};
use crate::dom::range::Range;

/// The part of one text node covered by a range (char offsets, end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSlice {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

/// Text slices covered by `range`, in document order
pub fn text_slices(doc: &Document, range: &Range) -> Vec<TextSlice> {
    if range.collapsed() {
        return Vec::new();
    }

    if range.start.node == range.end.node && doc.is_text(range.start.node) {
        let len = doc.node_len(range.start.node);
        let end = range.end.offset.min(len);
        if range.start.offset >= end {
            return Vec::new();
        }
        return vec![TextSlice {
            node: range.start.node,
            start: range.start.offset,
            end,
        }];
    }

    let ancestor = range.common_ancestor(doc);
    let walk_root = if doc.is_text(ancestor) {
        doc.parent(ancestor).unwrap_or(ancestor)
    } else {
        ancestor
    };

    let mut slices = Vec::new();
    for node in doc.text_nodes(walk_root) {
        if !range.intersects_node(doc, node) {
            // A run of intersecting nodes has ended; later nodes are unrelated
            if !slices.is_empty() {
                break;
            }
            continue;
        }

        let len = doc.node_len(node);
        let start = if node == range.start.node {
            range.start.offset.min(len)
        } else {
            0
        };
        let end = if node == range.end.node {
            range.end.offset.min(len)
        } else {
            len
        };

        if start < end {
            slices.push(TextSlice { node, start, end });
        }
    }

    slices
}

/// Text covered by `slices`, concatenated
pub fn slices_text(doc: &Document, slices: &[TextSlice]) -> String {
    slices
        .iter()
        .filter_map(|s| {
            doc.text(s.node)
                .map(|t| t.chars().skip(s.start).take(s.end - s.start).collect::<String>())
        })
        .collect()
}
