//! Memory Entry Module
//!
//! Defines the process-local tier's entry with its short local expiry.

use std::time::{Duration, Instant};

use serde_json::Value;

// == Memory Entry ==
/// A single memory-tier entry.
///
/// The local deadline is short and fixed, independent of the persistent
/// entry's TTL; it bounds how stale this tier can serve relative to the
/// persistent store.
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    /// The cached payload
    pub payload: Value,
    /// Local deadline after which the entry is evicted lazily
    expires_at: Instant,
}

impl MemoryEntry {
    // == Constructor ==
    /// Creates a new memory entry expiring after `ttl`.
    pub fn new(payload: Value, ttl: Duration) -> Self {
        Self {
            payload,
            expires_at: Instant::now() + ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the local deadline has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}
