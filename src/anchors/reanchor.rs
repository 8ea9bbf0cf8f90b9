//! Re-apply persisted annotations onto a freshly rendered document
//!
//! Annotations are located by their quoted text, in creation order. Each
//! quote keeps its own cursor, so repeated quotes land on distinct occurrences
//! in document order while different quotes (overlapping ones included) are
//! found independently. Anything that can no longer be found is dropped for
//! this load.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::anchors::mark::{mark, MarkSpec};
use crate::anchors::select::text_slices;
use crate::anchors::text_index::TextIndex;
use crate::core::annotation::{Annotation, AnnotationStore};
use crate::core::util::truncate_chars;
use crate::dom::node::{Document, NodeId};
use crate::error::DomError;

/// Result of one anchoring pass
#[derive(Debug, Clone, Default)]
pub struct AnchorOutcome {
    /// Annotations that were found and marked, ready to be re-persisted
    pub store: AnnotationStore,
    pub anchored: usize,
    pub dropped: Vec<Annotation>,
}

/// Mark every annotation of `store` under `root`
pub fn reanchor(
    doc: &mut Document,
    root: NodeId,
    store: &AnnotationStore,
) -> Result<AnchorOutcome, DomError> {
    let mut kept: Vec<Annotation> = Vec::with_capacity(store.len());
    let mut dropped = Vec::new();
    // End of the last occurrence taken, per quoted text
    let mut cursors: HashMap<&str, usize> = HashMap::new();

    for annotation in store.list() {
        // Marking splits nodes, so the index is rebuilt for every annotation
        let index = TextIndex::build(doc, root);

        let quote = annotation.quoted_text.as_str();
        let from = cursors.get(quote).copied().unwrap_or(0);
        let Some((start, end)) = index.find(quote, from) else {
            warn!(
                id = %annotation.id,
                quoted = %truncate_chars(&annotation.quoted_text, 60),
                "annotation text not found, dropping"
            );
            dropped.push(annotation.clone());
            continue;
        };

        let Some(range) = index.range_for(doc, start, end) else {
            warn!(id = %annotation.id, "annotation range could not be resolved, dropping");
            dropped.push(annotation.clone());
            continue;
        };

        let slices = text_slices(doc, &range);
        let spec = MarkSpec {
            id: annotation.id,
            kind: annotation.kind,
            comment: annotation.comment.clone(),
        };
        mark(doc, &slices, &spec)?;

        cursors.insert(quote, end);
        kept.push(annotation.clone());
    }

    let anchored = kept.len();
    if anchored > 0 || !dropped.is_empty() {
        info!(anchored, dropped = dropped.len(), "re-anchored annotations");
    }

    let mut restored = AnnotationStore::from_annotations(kept);
    // Ids of dropped annotations are still never handed out again
    restored.advance_next_id(store.next_id());

    Ok(AnchorOutcome {
        store: restored,
        anchored,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::mark::{marker_ids, markers_for};
    use crate::core::annotation::{AnnotationId, AnnotationKind};
    use crate::dom::render::render_markdown;

    fn store_of(items: &[(AnnotationKind, &str, Option<&str>)]) -> AnnotationStore {
        let mut store = AnnotationStore::new();
        for (kind, quoted, comment) in items {
            store
                .create(*kind, *quoted, comment.map(str::to_string))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_reanchor_marks_strike_and_earlier_comment() {
        let mut rendered = render_markdown(
            "# T\n\nFirst paragraph with some text to annotate.",
            "t.md",
        );
        let root = rendered.root();
        let store = store_of(&[
            (AnnotationKind::Strike, "some text", None),
            (AnnotationKind::Comment, "First paragraph", Some("Check this.")),
        ]);

        let outcome = reanchor(&mut rendered.doc, root, &store).unwrap();

        assert_eq!(outcome.anchored, 2);
        assert!(outcome.dropped.is_empty());
        assert_eq!(
            marker_ids(&rendered.doc, root),
            vec![AnnotationId(2), AnnotationId(1)]
        );
        let comment_marker = markers_for(&rendered.doc, root, AnnotationId(2))[0];
        assert_eq!(rendered.doc.attr(comment_marker, "title"), Some("Check this."));
    }

    #[test]
    fn test_overlapping_quotes_both_anchor() {
        let mut rendered = render_markdown("First paragraph with some text to annotate.", "t.md");
        let root = rendered.root();
        let store = store_of(&[
            (AnnotationKind::Strike, "some text", None),
            (AnnotationKind::Comment, "text to annotate", Some("reword")),
        ]);

        let outcome = reanchor(&mut rendered.doc, root, &store).unwrap();

        assert_eq!(outcome.anchored, 2);
        assert!(outcome.dropped.is_empty());
        assert!(!markers_for(&rendered.doc, root, AnnotationId(1)).is_empty());
        assert!(!markers_for(&rendered.doc, root, AnnotationId(2)).is_empty());
        assert_eq!(
            rendered.doc.text_content(root),
            "First paragraph with some text to annotate."
        );
    }

    #[test]
    fn test_reanchor_in_creation_order() {
        let mut rendered = render_markdown("alpha beta gamma", "t.md");
        let root = rendered.root();
        let store = store_of(&[
            (AnnotationKind::Strike, "alpha", None),
            (AnnotationKind::Comment, "gamma", Some("note")),
        ]);

        let outcome = reanchor(&mut rendered.doc, root, &store).unwrap();
        assert_eq!(outcome.anchored, 2);
        assert!(outcome.dropped.is_empty());

        let comment_marker = markers_for(&rendered.doc, root, AnnotationId(2))[0];
        assert_eq!(rendered.doc.attr(comment_marker, "title"), Some("note"));
        assert_eq!(rendered.doc.text_content(root), "alpha beta gamma");
    }

    #[test]
    fn test_duplicate_quotes_anchor_to_distinct_occurrences() {
        let mut rendered = render_markdown("the cat saw the dog and the bird", "t.md");
        let root = rendered.root();
        let store = store_of(&[
            (AnnotationKind::Strike, "the", None),
            (AnnotationKind::Strike, "the", None),
            (AnnotationKind::Strike, "the", None),
        ]);

        let outcome = reanchor(&mut rendered.doc, root, &store).unwrap();
        assert_eq!(outcome.anchored, 3);

        let positions: Vec<usize> = (1..=3)
            .map(|n| {
                let marker = markers_for(&rendered.doc, root, AnnotationId(n))[0];
                // chars preceding the marker in document order
                let text_node = rendered.doc.children(marker)[0];
                rendered
                    .doc
                    .text_nodes(root)
                    .into_iter()
                    .take_while(|t| *t != text_node)
                    .filter_map(|t| rendered.doc.text(t))
                    .map(|t| t.chars().count())
                    .sum::<usize>()
            })
            .collect();

        assert_eq!(positions, vec![0, 12, 24]);
    }

    #[test]
    fn test_more_duplicates_than_occurrences_drops_extra() {
        let mut rendered = render_markdown("one two one", "t.md");
        let root = rendered.root();
        let store = store_of(&[
            (AnnotationKind::Strike, "one", None),
            (AnnotationKind::Strike, "one", None),
            (AnnotationKind::Strike, "one", None),
        ]);

        let outcome = reanchor(&mut rendered.doc, root, &store).unwrap();
        assert_eq!(outcome.anchored, 2);
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.dropped[0].id, AnnotationId(3));
        assert_eq!(outcome.store.len(), 2);
    }

    #[test]
    fn test_drifted_text_is_dropped() {
        let mut rendered = render_markdown("The wording changed entirely.", "t.md");
        let root = rendered.root();
        let store = store_of(&[(AnnotationKind::Strike, "old wording", None)]);

        let outcome = reanchor(&mut rendered.doc, root, &store).unwrap();
        assert_eq!(outcome.anchored, 0);
        assert!(outcome.store.is_empty());
        assert!(marker_ids(&rendered.doc, root).is_empty());
    }

    #[test]
    fn test_quote_across_inline_formatting() {
        let mut rendered = render_markdown("Plain **bold** end", "t.md");
        let root = rendered.root();
        let store = store_of(&[(AnnotationKind::Strike, "ain bold e", None)]);

        let outcome = reanchor(&mut rendered.doc, root, &store).unwrap();
        assert_eq!(outcome.anchored, 1);
        assert_eq!(markers_for(&rendered.doc, root, AnnotationId(1)).len(), 3);
        assert_eq!(rendered.doc.text_content(root), "Plain bold end");
    }

    #[test]
    fn test_dropped_ids_are_not_reused() {
        let mut rendered = render_markdown("kept text", "t.md");
        let root = rendered.root();
        let store = store_of(&[
            (AnnotationKind::Strike, "kept", None),
            (AnnotationKind::Strike, "missing", None),
        ]);

        let mut outcome = reanchor(&mut rendered.doc, root, &store).unwrap();
        let next = outcome
            .store
            .create(AnnotationKind::Strike, "text", None)
            .unwrap();
        assert_eq!(next, AnnotationId(3));
    }
}
