//! Process-Local Tier Module
//!
//! A small bounded map in front of the persistent store for sub-millisecond
//! repeat access to complete-analysis results within one process lifetime.
//! Best-effort only: it is a cache of the persistent tier's current value,
//! never the source of truth, and is lost entirely on restart.

mod entry;
mod tier;

pub use entry::MemoryEntry;
pub use tier::{MemoryKey, MemoryTier};
