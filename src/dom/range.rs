//! Live ranges over a `Document`
//!
//! A boundary point is `(node, offset)`: a char offset for text nodes, a child
//! index for elements. Comparison follows tree order.

use std::cmp::Ordering;

use crate::dom::node::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selection range; `start` never comes after `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Range {
    /// Build a range, swapping the points if they are given backwards
    pub fn new(doc: &Document, a: BoundaryPoint, b: BoundaryPoint) -> Self {
        if compare_points(doc, a, b) == Ordering::Greater {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Deepest node containing both boundary containers
    pub fn common_ancestor(&self, doc: &Document) -> NodeId {
        let start_chain = doc.ancestors(self.start.node);
        doc.ancestors(self.end.node)
            .into_iter()
            .find(|n| start_chain.contains(n))
            .unwrap_or(self.start.node)
    }

    /// Whether any part of `node` lies inside the range
    pub fn intersects_node(&self, doc: &Document, node: NodeId) -> bool {
        let (parent, index) = match (doc.parent(node), doc.index_in_parent(node)) {
            (Some(parent), Some(index)) => (parent, index),
            _ => return true,
        };

        let before = BoundaryPoint::new(parent, index);
        let after = BoundaryPoint::new(parent, index + 1);

        compare_points(doc, before, self.end) == Ordering::Less
            && compare_points(doc, after, self.start) == Ordering::Greater
    }
}

/// Tree-order comparison of two boundary points
pub fn compare_points(doc: &Document, a: BoundaryPoint, b: BoundaryPoint) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }

    if doc.contains(a.node, b.node) {
        // a's container is an ancestor of b's: find which child of a leads to b
        let child_index = child_index_toward(doc, a.node, b.node);
        return if a.offset <= child_index {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }

    if doc.contains(b.node, a.node) {
        return compare_points(doc, b, a).reverse();
    }

    doc.tree_path(a.node).cmp(&doc.tree_path(b.node))
}

/// Index of the child of `ancestor` that is (or contains) `node`
fn child_index_toward(doc: &Document, ancestor: NodeId, node: NodeId) -> usize {
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        if parent == ancestor {
            return doc.index_in_parent(current).unwrap_or(0);
        }
        current = parent;
    }
    0
}
