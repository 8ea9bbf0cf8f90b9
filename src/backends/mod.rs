//! Backends module - filesystem and clipboard integrations
//!
//! Provides:
//! - scan: Markdown discovery with the ignore crate
//! - clipboard: Sinks for the export text

pub mod clipboard;
pub mod scan;
