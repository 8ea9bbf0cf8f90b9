//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Annotation records and the per-document store
//! - Unified result model (ResultItem)
//! - Rendering functions for different output formats
//! - Path normalization utilities
//! - Common utilities

pub mod annotation;
pub mod model;
pub mod paths;
pub mod render;
pub mod util;
