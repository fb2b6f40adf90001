//! Cache Entry Module
//!
//! Defines the persistent-tier row for a single cached analysis result.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::Result;

// == Cache Entry ==
/// A single persistent cache row.
///
/// The payload is opaque JSON text: the store round-trips it losslessly and
/// never inspects its shape. Access statistics are mutated only by
/// successful non-expired reads, never by writes.
#[derive(Debug, Clone, FromRow)]
pub struct CacheEntry {
    /// Unique lookup key derived from (category, barcode, user, question)
    pub cache_key: String,
    /// Category string form, mirrors the leading key segment
    pub data_type: String,
    /// Cached result as JSON text
    pub payload: String,
    /// Insertion timestamp, immutable after creation
    pub created_at: DateTime<Utc>,
    /// The entry is logically dead once now passes this
    pub expires_at: DateTime<Utc>,
    /// Successful non-expired reads since the last write
    pub access_count: i64,
    /// Timestamp of the most recent successful read
    pub last_accessed: Option<DateTime<Utc>>,
}

impl CacheEntry {
    // == Is Expired ==
    /// Checks whether the entry has expired as of `now`.
    ///
    /// Boundary condition: an entry is expired when `now >= expires_at`, so
    /// a row written with a non-positive TTL is a guaranteed miss on its
    /// very next read.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    // == Payload ==
    /// Deserializes the stored payload.
    pub fn payload_value(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}
