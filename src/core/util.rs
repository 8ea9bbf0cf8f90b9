//! Common utilities

use chrono::{DateTime, Utc};
use xxhash_rust::xxh3::xxh3_64;

/// Compute an xxh3 hash of bytes as 16 hex chars
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:016x}", xxh3_64(data))
}

/// Current time, used to stamp persisted pointers
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Truncate string to max chars, appending an ellipsis when cut
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('…');
    out
}
