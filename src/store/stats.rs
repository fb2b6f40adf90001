//! Cache Statistics Module
//!
//! Reporting types for cache inspection. All numbers are computed from the
//! persisted state at call time, never from a cached snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Store Stats ==
/// Aggregate counts over the whole persistent tier.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Total rows in the table
    pub total_entries: u64,
    /// Rows whose expiry is still in the future
    pub active_entries: u64,
    /// Rows already past their expiry but not yet reclaimed
    pub expired_entries: u64,
    /// Sum of access_count across all rows
    pub total_access: u64,
}

// == Category Stats ==
/// Per-category total/active/expired breakdown.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryStats {
    pub total: u64,
    pub active: u64,
    pub expired: u64,
}

// == Top Entry ==
/// One row of the most-accessed ranking.
#[derive(Debug, Clone, Serialize)]
pub struct TopEntry {
    pub cache_key: String,
    pub data_type: String,
    pub access_count: i64,
    pub last_accessed: Option<DateTime<Utc>>,
}

// == Cache Statistics ==
/// Full statistics report: store totals, per-category breakdown, and the
/// top-N most-accessed active entries ranked by access_count descending.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatistics {
    #[serde(flatten)]
    pub store: StoreStats,
    pub by_category: BTreeMap<String, CategoryStats>,
    pub top_entries: Vec<TopEntry>,
}

impl CacheStatistics {
    /// Hit-weighting indicator: average accesses per stored entry.
    pub fn average_access(&self) -> f64 {
        if self.store.total_entries == 0 {
            0.0
        } else {
            self.store.total_access as f64 / self.store.total_entries as f64
        }
    }
}
