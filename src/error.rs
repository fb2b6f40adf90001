//! Error types for the analysis cache
//!
//! Provides unified error handling using thiserror.
//!
//! A cache miss is not an error: read operations return `Ok(None)` when a
//! key is absent or expired. Errors here are real failures, such as the
//! storage layer being unreachable or a payload failing to round-trip.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the analysis cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Storage-layer failure in the persistent tier
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Payload could not be serialized or deserialized
    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the analysis cache.
pub type Result<T> = std::result::Result<T, CacheError>;
