//! Concatenated text content of a subtree
//!
//! Maps global char offsets in `root.text_content()` back to boundary points
//! so a search hit can be turned into a live range.

use crate::dom::node::{char_to_byte, Document, NodeId};
use crate::dom::range::{BoundaryPoint, Range};

#[derive(Debug, Clone, Copy)]
struct Segment {
    node: NodeId,
    start: usize,
    len: usize,
}

/// Snapshot of the text under a root; rebuild it after every mutation
#[derive(Debug, Clone)]
pub struct TextIndex {
    text: String,
    segments: Vec<Segment>,
    char_len: usize,
}

impl TextIndex {
    pub fn build(doc: &Document, root: NodeId) -> Self {
        let mut text = String::new();
        let mut segments = Vec::new();
        let mut offset = 0;

        for node in doc.text_nodes(root) {
            let content = doc.text(node).unwrap_or_default();
            let len = content.chars().count();
            if len == 0 {
                continue;
            }
            segments.push(Segment {
                node,
                start: offset,
                len,
            });
            text.push_str(content);
            offset += len;
        }

        Self {
            text,
            segments,
            char_len: offset,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    /// First occurrence of `needle` at or after char offset `from`, as `(start, end)`
    pub fn find(&self, needle: &str, from: usize) -> Option<(usize, usize)> {
        if needle.is_empty() || from > self.char_len {
            return None;
        }
        let from_byte = char_to_byte(&self.text, from);
        let hit_byte = self.text[from_byte..].find(needle)? + from_byte;
        let start = self.text[..hit_byte].chars().count();
        Some((start, start + needle.chars().count()))
    }

    /// The `nth` (0-based) occurrence of `needle`, occurrences never overlapping
    pub fn find_nth(&self, needle: &str, nth: usize) -> Option<(usize, usize)> {
        let mut from = 0;
        let mut hit = None;
        for _ in 0..=nth {
            let (start, end) = self.find(needle, from)?;
            hit = Some((start, end));
            from = end;
        }
        hit
    }

    /// Range covering global chars `[start, end)`; `None` when out of bounds or empty
    pub fn range_for(&self, doc: &Document, start: usize, end: usize) -> Option<Range> {
        if start >= end || end > self.char_len {
            return None;
        }

        let first = self
            .segments
            .iter()
            .find(|s| start >= s.start && start < s.start + s.len)?;
        let last = self
            .segments
            .iter()
            .find(|s| end > s.start && end <= s.start + s.len)?;

        Some(Range::new(
            doc,
            BoundaryPoint::new(first.node, start - first.start),
            BoundaryPoint::new(last.node, end - last.start),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::select::{slices_text, text_slices};
    use crate::dom::render::render_markdown;

    #[test]
    fn test_build_concatenates_text() {
        let rendered = render_markdown("# T\n\nFirst **bold** end", "t.md");
        let index = TextIndex::build(&rendered.doc, rendered.root());
        assert_eq!(index.text(), "TFirst bold end");
        assert_eq!(index.len(), 15);
    }

    #[test]
    fn test_find_from_offset() {
        let rendered = render_markdown("the cat and the dog", "t.md");
        let index = TextIndex::build(&rendered.doc, rendered.root());
        assert_eq!(index.find("the", 0), Some((0, 3)));
        assert_eq!(index.find("the", 1), Some((12, 15)));
        assert_eq!(index.find("the", 13), None);
        assert_eq!(index.find("", 0), None);
    }

    #[test]
    fn test_find_counts_chars_not_bytes() {
        let rendered = render_markdown("café au lait, café noir", "t.md");
        let index = TextIndex::build(&rendered.doc, rendered.root());
        assert_eq!(index.find("café", 1), Some((14, 18)));
    }

    #[test]
    fn test_find_nth() {
        let rendered = render_markdown("aa aa aa", "t.md");
        let index = TextIndex::build(&rendered.doc, rendered.root());
        assert_eq!(index.find_nth("aa", 0), Some((0, 2)));
        assert_eq!(index.find_nth("aa", 2), Some((6, 8)));
        assert_eq!(index.find_nth("aa", 3), None);
    }

    #[test]
    fn test_range_for_spans_nodes() {
        let rendered = render_markdown("# Title\n\nFirst **bold** end", "t.md");
        let index = TextIndex::build(&rendered.doc, rendered.root());
        let (start, end) = index.find("st bold e", 0).unwrap();
        let range = index.range_for(&rendered.doc, start, end).unwrap();
        let slices = text_slices(&rendered.doc, &range);

        assert_eq!(slices.len(), 3);
        assert_eq!(slices_text(&rendered.doc, &slices), "st bold e");
    }

    #[test]
    fn test_range_for_ending_at_node_boundary() {
        let rendered = render_markdown("First **bold** end", "t.md");
        let index = TextIndex::build(&rendered.doc, rendered.root());
        // "First " ends exactly where "bold" begins
        let range = index.range_for(&rendered.doc, 0, 6).unwrap();
        let slices = text_slices(&rendered.doc, &range);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices_text(&rendered.doc, &slices), "First ");
    }

    #[test]
    fn test_range_for_out_of_bounds() {
        let rendered = render_markdown("short", "t.md");
        let index = TextIndex::build(&rendered.doc, rendered.root());
        assert!(index.range_for(&rendered.doc, 2, 9).is_none());
        assert!(index.range_for(&rendered.doc, 3, 3).is_none());
    }
}
