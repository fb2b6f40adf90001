//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL for the persistent tier
    pub database_url: String,
    /// Maximum number of entries the memory tier can hold
    pub memory_max_entries: usize,
    /// Memory-tier TTL in seconds (short, independent of persistent TTLs)
    pub memory_ttl_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DATABASE_URL` - SQLite URL (default: `sqlite://analysis_cache.db?mode=rwc`)
    /// - `MEMORY_MAX_ENTRIES` - Memory-tier capacity (default: 256)
    /// - `MEMORY_TTL_SECS` - Memory-tier TTL in seconds (default: 300)
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("CACHE_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://analysis_cache.db?mode=rwc".to_string()),
            memory_max_entries: env::var("MEMORY_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
            memory_ttl_secs: env::var("MEMORY_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://analysis_cache.db?mode=rwc".to_string(),
            memory_max_entries: 256,
            memory_ttl_secs: 300,
        }
    }
}
