//! Cache module - Persisted annotation state under .brief/
//!
//! Provides:
//! - Key-value backends (one JSON file per key, or in memory)
//! - Persisted record types and their keys
//! - The persistence layer with its single-file / folder mode transitions

pub mod kv;
pub mod meta;
pub mod store;
