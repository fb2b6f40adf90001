//! Persistent Tier Module
//!
//! SQLite-backed storage for cache entries with expiry semantics and
//! access accounting. This tier is the ground truth: it is shared by every
//! process pointing at the same database file and survives restarts.

mod entry;
mod persistent;
mod stats;

pub use entry::CacheEntry;
pub use persistent::PersistentStore;
pub use stats::{CacheStatistics, CategoryStats, StoreStats, TopEntry};

// == Public Constants ==
/// Number of entries reported in the most-accessed ranking.
pub const TOP_ENTRIES_LIMIT: i64 = 10;
