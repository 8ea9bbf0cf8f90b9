//! Selection controller - debounced selection capture and overlay placement
//!
//! Presentation is out of scope here: this module only decides *when* a
//! selection is taken, *whether* the toolbar shows, and *where* overlays go.
//! Time is passed in explicitly so callers (and tests) own the clock.

use std::time::{Duration, Instant};

use crate::anchors::select::{slices_text, text_slices, TextSlice};
use crate::dom::node::Document;
use crate::dom::range::Range;

/// Delay after pointer/touch release before the selection is inspected
pub const SELECTION_DEBOUNCE: Duration = Duration::from_millis(20);

/// How long a notification stays up
pub const TOAST_DURATION: Duration = Duration::from_millis(2500);

/// Message shown after a successful export copy
pub const COPIED_MESSAGE: &str = "Annotations copied";

/// Gap kept between overlays and the selection or viewport edge
pub const EDGE_MARGIN: f64 = 8.0;

/// Horizontal room reserved for the comment popover
pub const POPOVER_WIDTH_ALLOWANCE: f64 = 336.0;

/// Vertical room reserved for the comment popover
pub const POPOVER_HEIGHT_ALLOWANCE: f64 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

/// Toolbar: centered above the selection, clamped horizontally, flipped below near the top
pub fn toolbar_position(selection: Rect, toolbar: Size, viewport: Size) -> Position {
    let mut top = selection.top - toolbar.height - EDGE_MARGIN;
    let left = selection.left + selection.width / 2.0 - toolbar.width / 2.0;
    let left = left
        .min(viewport.width - toolbar.width - EDGE_MARGIN)
        .max(EDGE_MARGIN);
    if top < EDGE_MARGIN {
        top = selection.bottom() + EDGE_MARGIN;
    }
    Position { top, left }
}

/// Comment popover: below the anchor, flipped above when it would overflow
pub fn popover_position(anchor: Rect, viewport: Size) -> Position {
    let mut top = anchor.bottom() + EDGE_MARGIN;
    let left = anchor
        .left
        .min(viewport.width - POPOVER_WIDTH_ALLOWANCE)
        .max(EDGE_MARGIN);
    if top + POPOVER_HEIGHT_ALLOWANCE > viewport.height {
        top = anchor.top - POPOVER_HEIGHT_ALLOWANCE;
    }
    Position { top, left }
}

/// Annotation detail card: below the marker, flipped above near the bottom edge
pub fn detail_position(anchor: Rect, detail: Size, viewport: Size) -> Position {
    let mut top = anchor.bottom() + EDGE_MARGIN;
    let left = anchor
        .left
        .min(viewport.width - detail.width - EDGE_MARGIN)
        .max(EDGE_MARGIN);
    if top + detail.height > viewport.height - EDGE_MARGIN {
        top = anchor.top - detail.height - EDGE_MARGIN;
    }
    Position { top, left }
}

/// Trailing-edge debounce: every trigger restarts the wait
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True exactly once, when the wait has elapsed
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

/// A transient notification; showing a new one replaces the old one
#[derive(Debug, Clone, Default)]
pub struct Toast {
    current: Option<(String, Instant)>,
}

impl Toast {
    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.current = Some((message.into(), now + TOAST_DURATION));
    }

    /// The visible message at `now`, if any
    pub fn visible(&self, now: Instant) -> Option<&str> {
        match &self.current {
            Some((message, until)) if now < *until => Some(message.as_str()),
            _ => None,
        }
    }
}

/// A captured, non-empty selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub range: Range,
    pub slices: Vec<TextSlice>,
    pub text: String,
}

/// Capture `range`; `None` when it covers no text
pub fn capture_selection(doc: &Document, range: &Range) -> Option<Selection> {
    let slices = text_slices(doc, range);
    if slices.is_empty() {
        return None;
    }
    let text = slices_text(doc, &slices);
    Some(Selection {
        range: *range,
        slices,
        text,
    })
}

/// Debounced selection observation plus toolbar/popover visibility
#[derive(Debug, Clone)]
pub struct SelectionController {
    debouncer: Debouncer,
    saved: Option<Selection>,
    toolbar_visible: bool,
    popover_open: bool,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            debouncer: Debouncer::new(SELECTION_DEBOUNCE),
            saved: None,
            toolbar_visible: false,
            popover_open: false,
        }
    }

    /// Pointer or touch released
    pub fn on_release(&mut self, now: Instant) {
        self.debouncer.trigger(now);
    }

    /// Inspect the live selection once the debounce has elapsed
    ///
    /// Returns whether the toolbar is visible afterwards.
    pub fn poll(&mut self, now: Instant, doc: &Document, live: Option<&Range>) -> bool {
        if !self.debouncer.fire(now) {
            return self.toolbar_visible;
        }

        match live.and_then(|range| capture_selection(doc, range)) {
            Some(selection) => {
                self.saved = Some(selection);
                self.toolbar_visible = true;
            }
            None => {
                // An open popover keeps its selection
                if !self.popover_open {
                    self.saved = None;
                    self.toolbar_visible = false;
                }
            }
        }
        self.toolbar_visible
    }

    pub fn toolbar_visible(&self) -> bool {
        self.toolbar_visible
    }

    pub fn popover_open(&self) -> bool {
        self.popover_open
    }

    pub fn saved(&self) -> Option<&Selection> {
        self.saved.as_ref()
    }

    /// Comment action: hide the toolbar and open the popover over the saved selection
    pub fn open_popover(&mut self) -> bool {
        if self.saved.is_none() {
            return false;
        }
        self.toolbar_visible = false;
        self.popover_open = true;
        true
    }

    /// Hand the saved selection to an action and reset the overlays
    pub fn take(&mut self) -> Option<Selection> {
        self.toolbar_visible = false;
        self.popover_open = false;
        self.saved.take()
    }

    /// Escape or outside click
    pub fn dismiss(&mut self) {
        self.toolbar_visible = false;
        self.popover_open = false;
        self.saved = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::range::BoundaryPoint;
    use crate::dom::render::render_markdown;

    const VIEWPORT: Size = Size {
        width: 1000.0,
        height: 800.0,
    };
    const TOOLBAR: Size = Size {
        width: 160.0,
        height: 40.0,
    };

    fn rect(top: f64, left: f64, width: f64, height: f64) -> Rect {
        Rect {
            top,
            left,
            width,
            height,
        }
    }

    #[test]
    fn test_toolbar_above_and_centered() {
        let pos = toolbar_position(rect(300.0, 400.0, 200.0, 20.0), TOOLBAR, VIEWPORT);
        assert_eq!(pos.top, 252.0);
        assert_eq!(pos.left, 420.0);
    }

    #[test]
    fn test_toolbar_clamped_to_viewport() {
        let near_left = toolbar_position(rect(300.0, 0.0, 20.0, 20.0), TOOLBAR, VIEWPORT);
        assert_eq!(near_left.left, 8.0);

        let near_right = toolbar_position(rect(300.0, 990.0, 10.0, 20.0), TOOLBAR, VIEWPORT);
        assert_eq!(near_right.left, 1000.0 - 160.0 - 8.0);
    }

    #[test]
    fn test_toolbar_flips_below_near_top() {
        let pos = toolbar_position(rect(20.0, 400.0, 100.0, 20.0), TOOLBAR, VIEWPORT);
        assert_eq!(pos.top, 48.0);
    }

    #[test]
    fn test_popover_below_or_above() {
        let below = popover_position(rect(100.0, 50.0, 100.0, 20.0), VIEWPORT);
        assert_eq!(below.top, 128.0);
        assert_eq!(below.left, 50.0);

        let above = popover_position(rect(700.0, 900.0, 50.0, 20.0), VIEWPORT);
        assert_eq!(above.top, 540.0);
        assert_eq!(above.left, 1000.0 - 336.0);
    }

    #[test]
    fn test_detail_flips_near_bottom() {
        let card = Size {
            width: 280.0,
            height: 120.0,
        };
        let pos = detail_position(rect(720.0, 10.0, 40.0, 20.0), card, VIEWPORT);
        assert_eq!(pos.top, 720.0 - 120.0 - 8.0);
        assert_eq!(pos.left, 10.0);
    }

    #[test]
    fn test_debouncer_fires_once_after_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(SELECTION_DEBOUNCE);
        assert!(!debouncer.fire(start));

        debouncer.trigger(start);
        assert!(!debouncer.fire(start + Duration::from_millis(10)));
        // a second release restarts the wait
        debouncer.trigger(start + Duration::from_millis(10));
        assert!(!debouncer.fire(start + Duration::from_millis(25)));
        assert!(debouncer.fire(start + Duration::from_millis(30)));
        assert!(!debouncer.fire(start + Duration::from_millis(40)));
    }

    #[test]
    fn test_toast_auto_dismisses() {
        let start = Instant::now();
        let mut toast = Toast::default();
        toast.show(COPIED_MESSAGE, start);

        assert_eq!(toast.visible(start), Some("Annotations copied"));
        assert_eq!(toast.visible(start + Duration::from_millis(2499)), Some("Annotations copied"));
        assert_eq!(toast.visible(start + TOAST_DURATION), None);
    }

    #[test]
    fn test_capture_selection() {
        let rendered = render_markdown("Some **bold** words", "t.md");
        let texts = rendered.doc.text_nodes(rendered.root());
        let range = Range::new(
            &rendered.doc,
            BoundaryPoint::new(texts[0], 2),
            BoundaryPoint::new(texts[2], 3),
        );

        let selection = capture_selection(&rendered.doc, &range).unwrap();
        assert_eq!(selection.text, "me bold wo");
        assert_eq!(selection.slices.len(), 3);
    }

    #[test]
    fn test_controller_shows_toolbar_for_selection() {
        let rendered = render_markdown("Some words", "t.md");
        let text = rendered.doc.text_nodes(rendered.root())[0];
        let range = Range::new(
            &rendered.doc,
            BoundaryPoint::new(text, 0),
            BoundaryPoint::new(text, 4),
        );
        let start = Instant::now();
        let mut controller = SelectionController::new();

        controller.on_release(start);
        assert!(!controller.poll(start, &rendered.doc, Some(&range)));
        assert!(controller.poll(start + SELECTION_DEBOUNCE, &rendered.doc, Some(&range)));
        assert_eq!(controller.saved().map(|s| s.text.as_str()), Some("Some"));

        let taken = controller.take().unwrap();
        assert_eq!(taken.text, "Some");
        assert!(!controller.toolbar_visible());
    }

    #[test]
    fn test_controller_collapsed_selection_hides_toolbar() {
        let rendered = render_markdown("Some words", "t.md");
        let text = rendered.doc.text_nodes(rendered.root())[0];
        let point = BoundaryPoint::new(text, 2);
        let collapsed = Range::new(&rendered.doc, point, point);
        let start = Instant::now();
        let mut controller = SelectionController::new();

        controller.on_release(start);
        assert!(!controller.poll(start + SELECTION_DEBOUNCE, &rendered.doc, Some(&collapsed)));
        assert!(controller.saved().is_none());
    }

    #[test]
    fn test_open_popover_keeps_selection() {
        let rendered = render_markdown("Some words", "t.md");
        let text = rendered.doc.text_nodes(rendered.root())[0];
        let range = Range::new(
            &rendered.doc,
            BoundaryPoint::new(text, 5),
            BoundaryPoint::new(text, 10),
        );
        let start = Instant::now();
        let mut controller = SelectionController::new();
        controller.on_release(start);
        controller.poll(start + SELECTION_DEBOUNCE, &rendered.doc, Some(&range));
        assert!(controller.open_popover());

        // focus moves into the popover and the page selection collapses
        controller.on_release(start + Duration::from_millis(100));
        controller.poll(start + Duration::from_millis(200), &rendered.doc, None);

        assert!(controller.popover_open());
        assert_eq!(controller.saved().map(|s| s.text.as_str()), Some("words"));
        controller.dismiss();
        assert!(controller.saved().is_none());
    }
}
