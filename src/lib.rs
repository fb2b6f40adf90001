//! Analysis Cache - a two-tier cache for product analysis results
//!
//! A SQLite-backed persistent tier with per-category TTLs, access
//! accounting, and explicit invalidation, fronted by a small process-local
//! memory tier for the complete-analysis fast path.

pub mod category;
pub mod config;
pub mod error;
pub mod keys;
pub mod memory;
pub mod service;
pub mod store;

pub use category::{Category, TtlPolicy};
pub use config::Config;
pub use error::{CacheError, Result};
pub use service::CacheService;
pub use store::{CacheStatistics, PersistentStore};
