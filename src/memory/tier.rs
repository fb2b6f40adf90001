//! Memory Tier Module
//!
//! Bounded map with least-recently-used eviction and lazy local expiry.
//! One instance is owned by the cache service and guarded by its lock;
//! nothing here is shared across processes.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use serde_json::Value;

use crate::memory::MemoryEntry;

// == Memory Key ==
/// Composite key for the memory tier: a barcode plus the optional user
/// dimension. `user_id: None` is the shared, non-personalized slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryKey {
    pub barcode: String,
    pub user_id: Option<i64>,
}

impl MemoryKey {
    pub fn new(barcode: impl Into<String>, user_id: Option<i64>) -> Self {
        Self {
            barcode: barcode.into(),
            user_id,
        }
    }
}

// == Memory Tier ==
/// Process-local cache tier for complete-analysis payloads.
#[derive(Debug)]
pub struct MemoryTier {
    /// Key-value storage
    entries: HashMap<MemoryKey, MemoryEntry>,
    /// Access order: front = most recently used, back = least
    order: VecDeque<MemoryKey>,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Fixed short TTL applied to every entry
    ttl: Duration,
}

impl MemoryTier {
    // == Constructor ==
    /// Creates a new tier bounded to `max_entries` with the given local TTL.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
            ttl,
        }
    }

    // == Get ==
    /// Returns the payload if present and not past its local deadline.
    ///
    /// An entry found expired is removed on the spot.
    pub fn get(&mut self, key: &MemoryKey) -> Option<Value> {
        let entry = self.entries.get(key)?;

        if entry.is_expired() {
            self.entries.remove(key);
            self.remove_from_order(key);
            return None;
        }

        let payload = entry.payload.clone();
        self.touch(key);
        Some(payload)
    }

    // == Insert ==
    /// Stores a payload, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: MemoryKey, payload: Value) {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.order.pop_back() {
                self.entries.remove(&evicted);
            }
        }

        self.entries.insert(key.clone(), MemoryEntry::new(payload, self.ttl));
        self.touch(&key);
    }

    // == Length ==
    /// Current number of entries, including any not yet lazily expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tier holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Order Maintenance ==
    /// Marks a key as most recently used.
    fn touch(&mut self, key: &MemoryKey) {
        self.remove_from_order(key);
        self.order.push_front(key.clone());
    }

    fn remove_from_order(&mut self, key: &MemoryKey) {
        self.order.retain(|k| k != key);
    }
}
