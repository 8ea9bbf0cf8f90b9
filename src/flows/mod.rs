//! Flows module - operations combining anchors, storage and rendering
//!
//! Provides:
//! - commands: One handler per CLI subcommand
//! - export: The change-request text built from annotation stores
//! - selection: Selection capture, debouncing and overlay placement
//! - session: The workspace the CLI drives (open, annotate, navigate, export)

pub mod commands;
pub mod export;
pub mod selection;
pub mod session;
