//! Cache Service
//!
//! Category-aware facade over the persistent store. Adds the process-local
//! memory tier for the complete-analysis fast path, cache-key construction,
//! per-category TTL policy, targeted invalidation, and aggregate statistics.
//!
//! The service never computes an analysis itself: a total miss is reported
//! as `Ok(None)` and the caller decides whether to recompute and store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::category::{Category, TtlPolicy};
use crate::config::Config;
use crate::error::Result;
use crate::keys::{build_key, product_prefix};
use crate::memory::{MemoryKey, MemoryTier};
use crate::store::{CacheStatistics, PersistentStore, TOP_ENTRIES_LIMIT};

struct Inner {
    store: PersistentStore,
    memory: RwLock<MemoryTier>,
    ttl: TtlPolicy,
}

// == Cache Service ==
/// Facade consumed by the analysis pipeline.
///
/// Construct one instance at the composition root and share it by cloning;
/// clones are cheap handles onto the same memory tier and connection pool.
#[derive(Clone)]
pub struct CacheService {
    inner: Arc<Inner>,
}

impl CacheService {
    // == Constructors ==
    /// Creates a service over an already-connected store with default TTLs.
    pub fn new(store: PersistentStore, config: &Config) -> Self {
        Self::with_policy(store, config, TtlPolicy::default())
    }

    /// Creates a service with a custom TTL policy.
    ///
    /// Whatever the numbers, a category's TTL applies uniformly to every
    /// `set` for that category.
    pub fn with_policy(store: PersistentStore, config: &Config, ttl: TtlPolicy) -> Self {
        let memory = MemoryTier::new(
            config.memory_max_entries,
            Duration::from_secs(config.memory_ttl_secs),
        );
        info!(
            "Cache service initialized (memory tier: {} entries, {}s TTL)",
            config.memory_max_entries, config.memory_ttl_secs
        );
        Self {
            inner: Arc::new(Inner {
                store,
                memory: RwLock::new(memory),
                ttl,
            }),
        }
    }

    /// Connects to the configured database and builds the service.
    pub async fn connect(config: &Config) -> Result<Self> {
        let store = PersistentStore::connect(&config.database_url).await?;
        Ok(Self::new(store, config))
    }

    // == Complete Analysis ==
    /// Retrieves a cached complete analysis.
    ///
    /// Probes the memory tier first; within its short local TTL a repeat
    /// read never touches the persistent store. A persistent hit refreshes
    /// the memory tier before returning.
    pub async fn get_cached_analysis(
        &self,
        barcode: &str,
        user_id: Option<i64>,
    ) -> Result<Option<Value>> {
        let memory_key = MemoryKey::new(barcode, user_id);
        if let Some(payload) = self.inner.memory.write().await.get(&memory_key) {
            debug!("Memory-tier hit for complete analysis: {}", barcode);
            return Ok(Some(payload));
        }

        let key = build_key(Category::CompleteAnalysis, barcode, user_id, None);
        let cached = self.inner.store.get(&key, Category::CompleteAnalysis).await?;

        if let Some(payload) = &cached {
            info!("Cache hit for complete analysis: {}", barcode);
            self.inner
                .memory
                .write()
                .await
                .insert(memory_key, payload.clone());
        }

        Ok(cached)
    }

    /// Caches a complete analysis in both tiers.
    pub async fn set_cached_analysis(
        &self,
        barcode: &str,
        payload: &Value,
        user_id: Option<i64>,
    ) -> Result<()> {
        let key = build_key(Category::CompleteAnalysis, barcode, user_id, None);
        let ttl_hours = self.inner.ttl.ttl_hours(Category::CompleteAnalysis);
        self.inner
            .store
            .set(&key, Category::CompleteAnalysis, payload, ttl_hours)
            .await?;

        self.inner
            .memory
            .write()
            .await
            .insert(MemoryKey::new(barcode, user_id), payload.clone());

        info!("Cached complete analysis: {} (TTL: {}h)", barcode, ttl_hours);
        Ok(())
    }

    // == Product Info ==
    /// Retrieves cached product information.
    pub async fn get_cached_product_info(&self, barcode: &str) -> Result<Option<Value>> {
        let cached = self.get_cached(Category::ProductInfo, barcode, None, None).await?;
        if cached.is_some() {
            info!("Cache hit for product info: {}", barcode);
        }
        Ok(cached)
    }

    /// Caches product information.
    pub async fn set_cached_product_info(&self, barcode: &str, payload: &Value) -> Result<()> {
        self.set_cached(Category::ProductInfo, barcode, None, None, payload).await
    }

    // == AI Analysis ==
    /// Retrieves a cached AI analysis, optionally scoped to a question.
    pub async fn get_cached_ai_analysis(
        &self,
        barcode: &str,
        user_id: i64,
        question: Option<&str>,
    ) -> Result<Option<Value>> {
        let cached = self
            .get_cached(Category::AiAnalysis, barcode, Some(user_id), question)
            .await?;
        if cached.is_some() {
            info!("Cache hit for AI analysis: {} (user: {})", barcode, user_id);
        }
        Ok(cached)
    }

    /// Caches an AI analysis.
    pub async fn set_cached_ai_analysis(
        &self,
        barcode: &str,
        user_id: i64,
        payload: &Value,
        question: Option<&str>,
    ) -> Result<()> {
        self.set_cached(Category::AiAnalysis, barcode, Some(user_id), question, payload)
            .await
    }

    // == Safety Score ==
    /// Retrieves a cached safety score.
    pub async fn get_cached_safety_score(
        &self,
        barcode: &str,
        user_id: Option<i64>,
    ) -> Result<Option<Value>> {
        let cached = self.get_cached(Category::SafetyScore, barcode, user_id, None).await?;
        if cached.is_some() {
            info!("Cache hit for safety score: {}", barcode);
        }
        Ok(cached)
    }

    /// Caches a safety score.
    pub async fn set_cached_safety_score(
        &self,
        barcode: &str,
        payload: &Value,
        user_id: Option<i64>,
    ) -> Result<()> {
        self.set_cached(Category::SafetyScore, barcode, user_id, None, payload).await
    }

    // == Generic Accessors ==
    /// Retrieves a cached payload for any category.
    ///
    /// The memory tier serves the complete-analysis category only; every
    /// other category goes straight to the persistent store.
    pub async fn get_cached(
        &self,
        category: Category,
        barcode: &str,
        user_id: Option<i64>,
        question: Option<&str>,
    ) -> Result<Option<Value>> {
        let key = build_key(category, barcode, user_id, question);
        self.inner.store.get(&key, category).await
    }

    /// Caches a payload under any category with that category's TTL.
    pub async fn set_cached(
        &self,
        category: Category,
        barcode: &str,
        user_id: Option<i64>,
        question: Option<&str>,
        payload: &Value,
    ) -> Result<()> {
        let key = build_key(category, barcode, user_id, question);
        let ttl_hours = self.inner.ttl.ttl_hours(category);
        self.inner.store.set(&key, category, payload, ttl_hours).await?;
        info!("Cached {}: {} (TTL: {}h)", category, barcode, ttl_hours);
        Ok(())
    }

    // == Invalidation ==
    /// Removes every persistent entry derived from a barcode, across all
    /// categories. Returns the total rows removed.
    ///
    /// An empty barcode is a no-op returning 0. Memory-tier entries are not
    /// proactively purged; they age out within their own short local TTL.
    pub async fn invalidate_product(&self, barcode: &str) -> Result<u64> {
        if barcode.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        for category in Category::ALL {
            let prefix = product_prefix(category, barcode);
            removed += self.inner.store.delete_by_prefix(&prefix).await?;
        }

        info!("Cleared cache for product {}: {} entries", barcode, removed);
        Ok(removed)
    }

    /// Removes every expired persistent entry; returns the count.
    pub async fn clear_expired(&self) -> Result<u64> {
        let removed = self.inner.store.clear_expired().await?;
        info!("Cleared expired cache: {} entries", removed);
        Ok(removed)
    }

    /// Removes every persistent entry unconditionally; returns the count.
    ///
    /// Destructive. Confirmation belongs to the caller.
    pub async fn clear_all(&self) -> Result<u64> {
        let removed = self.inner.store.clear_all().await?;
        info!("Cleared entire cache: {} entries", removed);
        Ok(removed)
    }

    // == Statistics ==
    /// Full statistics report, computed from store state at call time.
    pub async fn statistics(&self) -> Result<CacheStatistics> {
        let store = self.inner.store.stats().await?;
        let by_category = self.inner.store.category_stats().await?;
        let top_entries = self.inner.store.top_entries(TOP_ENTRIES_LIMIT).await?;

        Ok(CacheStatistics {
            store,
            by_category,
            top_entries,
        })
    }

    // == Availability ==
    /// Checks whether the persistent tier is reachable.
    ///
    /// Individual get/set operations still surface storage errors; this is
    /// for callers that want to decide up front whether to bother.
    pub async fn is_available(&self) -> bool {
        match self.inner.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                error!("Cache not available: {}", e);
                false
            }
        }
    }

    /// Current memory-tier entry count.
    pub async fn memory_len(&self) -> usize {
        self.inner.memory.read().await.len()
    }

    /// Direct access to the persistent store, for maintenance tooling.
    pub fn store(&self) -> &PersistentStore {
        &self.inner.store
    }
}
