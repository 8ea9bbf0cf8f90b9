//! Anchors module - map selections onto the document and keep them there
//!
//! `select` turns a range into text slices, `mark` wraps slices in markers,
//! `text_index` maps plain-text offsets back to ranges and `reanchor` replays
//! a persisted store onto a fresh render.

pub mod mark;
pub mod reanchor;
pub mod select;
pub mod text_index;
