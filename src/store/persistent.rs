//! Persistent Cache Store
//!
//! Durable storage for cache entries on SQLite, with lazy expiry and access
//! accounting. Storage failures propagate unmodified; the absence of a key
//! is the `None` outcome of `get`, not an error.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::category::Category;
use crate::error::Result;
use crate::store::{CacheEntry, CategoryStats, StoreStats, TopEntry};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS product_cache (
    cache_key     TEXT PRIMARY KEY,
    data_type     TEXT NOT NULL,
    payload       TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    expires_at    TEXT NOT NULL,
    access_count  INTEGER NOT NULL DEFAULT 0,
    last_accessed TEXT
);
CREATE INDEX IF NOT EXISTS idx_product_cache_data_type ON product_cache (data_type);
CREATE INDEX IF NOT EXISTS idx_product_cache_expires_at ON product_cache (expires_at);
"#;

// == Persistent Store ==
/// SQLite-backed cache store shared by all processes using the same file.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PersistentStore {
    pool: SqlitePool,
}

impl PersistentStore {
    // == Constructors ==
    /// Connects to the given SQLite URL and bootstraps the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Connecting to cache database: {}", database_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.bootstrap().await?;
        info!("Cache store ready");
        Ok(store)
    }

    /// Opens an in-memory store.
    ///
    /// The pool is pinned to a single connection because each in-memory
    /// SQLite connection owns a separate database.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.bootstrap().await?;
        Ok(store)
    }

    async fn bootstrap(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    // == Get ==
    /// Looks up a payload by exact (key, category) pair.
    ///
    /// An expired row is deleted on the spot and reported as a miss: the
    /// entry is never returned once past its expiry, even if the sweep has
    /// not run. A live hit increments `access_count` atomically in SQL and
    /// stamps `last_accessed`.
    pub async fn get(&self, key: &str, category: Category) -> Result<Option<Value>> {
        let entry = sqlx::query_as::<_, CacheEntry>(
            "SELECT cache_key, data_type, payload, created_at, expires_at, access_count, last_accessed
             FROM product_cache WHERE cache_key = ? AND data_type = ?",
        )
        .bind(key)
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        let now = Utc::now();
        if entry.is_expired(now) {
            // Lazy expiry: reclaim the row before reporting the miss.
            self.reclaim_expired(key, now).await?;
            debug!("Expired entry reclaimed on read: {}", key);
            return Ok(None);
        }

        sqlx::query(
            "UPDATE product_cache SET access_count = access_count + 1, last_accessed = ?
             WHERE cache_key = ?",
        )
        .bind(now)
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(Some(entry.payload_value()?))
    }

    /// Deletes a row only if it is still expired as of `now`.
    ///
    /// The condition matters: between a reader observing an expired row and
    /// reclaiming it, a concurrent `set` may have refreshed the key. An
    /// unconditional delete would drop that live write; conditioned on
    /// `expires_at <= now`, the reclaim becomes a no-op instead.
    async fn reclaim_expired(&self, key: &str, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("DELETE FROM product_cache WHERE cache_key = ? AND expires_at <= ?")
            .bind(key)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // == Set ==
    /// Upserts a payload under the given key.
    ///
    /// Overwriting replaces the payload and expiry and resets `access_count`
    /// to 0; `created_at` is set once at insertion and kept on overwrite.
    /// A non-positive TTL yields an already-expired row, so the next read is
    /// a guaranteed miss rather than an error.
    pub async fn set(
        &self,
        key: &str,
        category: Category,
        payload: &Value,
        ttl_hours: i64,
    ) -> Result<()> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(ttl_hours);
        let payload_text = serde_json::to_string(payload)?;

        sqlx::query(
            "INSERT INTO product_cache
                 (cache_key, data_type, payload, created_at, expires_at, access_count, last_accessed)
             VALUES (?, ?, ?, ?, ?, 0, NULL)
             ON CONFLICT(cache_key) DO UPDATE SET
                 data_type = excluded.data_type,
                 payload = excluded.payload,
                 expires_at = excluded.expires_at,
                 access_count = 0,
                 last_accessed = NULL",
        )
        .bind(key)
        .bind(category.as_str())
        .bind(payload_text)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // == Clear Expired ==
    /// Deletes every row past its expiry; returns the number removed.
    ///
    /// Safe to run concurrently with reads lazily expiring the same rows;
    /// both outcomes converge to the row being absent.
    pub async fn clear_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM product_cache WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // == Clear All ==
    /// Unconditionally deletes every row; returns the number removed.
    ///
    /// Confirmation is the caller's concern, not this layer's.
    pub async fn clear_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM product_cache")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // == Delete By Prefix ==
    /// Deletes every row whose key starts with `prefix`; returns the count.
    ///
    /// Matched with substr rather than LIKE so underscores in category
    /// names are not treated as wildcards.
    pub async fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM product_cache WHERE substr(cache_key, 1, length(?)) = ?")
                .bind(prefix)
                .bind(prefix)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    // == Stats ==
    /// Aggregate counts computed from the current table state.
    pub async fn stats(&self) -> Result<StoreStats> {
        let (total, active, total_access): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN expires_at > ? THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(access_count), 0)
             FROM product_cache",
        )
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            total_entries: total as u64,
            active_entries: active as u64,
            expired_entries: (total - active) as u64,
            total_access: total_access as u64,
        })
    }

    // == Category Stats ==
    /// Per-category total/active/expired breakdown.
    ///
    /// Categories with no rows are reported with zero counts.
    pub async fn category_stats(&self) -> Result<BTreeMap<String, CategoryStats>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            "SELECT data_type,
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN expires_at > ? THEN 1 ELSE 0 END), 0)
             FROM product_cache GROUP BY data_type",
        )
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;

        let mut by_category: BTreeMap<String, CategoryStats> = Category::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), CategoryStats::default()))
            .collect();

        for (data_type, total, active) in rows {
            by_category.insert(
                data_type,
                CategoryStats {
                    total: total as u64,
                    active: active as u64,
                    expired: (total - active) as u64,
                },
            );
        }

        Ok(by_category)
    }

    // == Top Entries ==
    /// The most-accessed currently-active entries, ranked by access_count
    /// descending, bounded to `limit`.
    pub async fn top_entries(&self, limit: i64) -> Result<Vec<TopEntry>> {
        let rows: Vec<(String, String, i64, Option<chrono::DateTime<Utc>>)> = sqlx::query_as(
            "SELECT cache_key, data_type, access_count, last_accessed
             FROM product_cache WHERE expires_at > ?
             ORDER BY access_count DESC LIMIT ?",
        )
        .bind(Utc::now())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(cache_key, data_type, access_count, last_accessed)| TopEntry {
                cache_key,
                data_type,
                access_count,
                last_accessed,
            })
            .collect())
    }

    // == Ping ==
    /// Availability probe for the underlying database.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // == Force Expire (test support) ==
    /// Backdates an entry's expiry, simulating the passage of time.
    #[doc(hidden)]
    pub async fn force_expire(&self, key: &str) -> Result<()> {
        sqlx::query("UPDATE product_cache SET expires_at = ? WHERE cache_key = ?")
            .bind(Utc::now() - Duration::hours(1))
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // == Row Lookup (test support) ==
    /// Fetches the raw row for a key, ignoring expiry.
    #[doc(hidden)]
    pub async fn raw_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let entry = sqlx::query_as::<_, CacheEntry>(
            "SELECT cache_key, data_type, payload, created_at, expires_at, access_count, last_accessed
             FROM product_cache WHERE cache_key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn test_store() -> PersistentStore {
        PersistentStore::connect_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get_round_trip() {
        let store = test_store().await;
        let payload = json!({"score": 72, "ingredients": ["aqua", "glycerin"]});

        store
            .set("complete_analysis_123", Category::CompleteAnalysis, &payload, 6)
            .await
            .unwrap();

        let cached = store
            .get("complete_analysis_123", Category::CompleteAnalysis)
            .await
            .unwrap();
        assert_eq!(cached, Some(payload));
    }

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let store = test_store().await;
        let cached = store.get("nonexistent", Category::ProductInfo).await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_get_requires_matching_category() {
        let store = test_store().await;
        store
            .set("product_info_123", Category::ProductInfo, &json!({"name": "x"}), 24)
            .await
            .unwrap();

        let wrong = store.get("product_info_123", Category::SafetyScore).await.unwrap();
        assert!(wrong.is_none());
    }

    #[tokio::test]
    async fn test_expired_read_deletes_row() {
        let store = test_store().await;
        store
            .set("product_info_123", Category::ProductInfo, &json!({"name": "x"}), 24)
            .await
            .unwrap();
        store.force_expire("product_info_123").await.unwrap();

        let cached = store.get("product_info_123", Category::ProductInfo).await.unwrap();
        assert!(cached.is_none());

        // The expired read must have reclaimed the row itself.
        let row = store.raw_entry("product_info_123").await.unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_reclaim_spares_row_refreshed_by_concurrent_write() {
        let store = test_store().await;
        let key = "complete_analysis_42";

        // A reader observes this row as expired...
        store
            .set(key, Category::CompleteAnalysis, &json!({"rev": 1}), 0)
            .await
            .unwrap();
        let observed_at = Utc::now();

        // ...but before it reclaims, a writer refreshes the key.
        store
            .set(key, Category::CompleteAnalysis, &json!({"rev": 2}), 6)
            .await
            .unwrap();

        // The reader's reclaim must leave the fresh row untouched.
        store.reclaim_expired(key, observed_at).await.unwrap();

        let cached = store
            .get(key, Category::CompleteAnalysis)
            .await
            .unwrap()
            .expect("refreshed entry must survive a stale reclaim");
        assert_eq!(cached["rev"], 2);
    }

    #[tokio::test]
    async fn test_reclaim_removes_row_still_expired() {
        let store = test_store().await;
        let key = "product_info_42";

        store
            .set(key, Category::ProductInfo, &json!({"name": "x"}), 0)
            .await
            .unwrap();
        store.reclaim_expired(key, Utc::now()).await.unwrap();

        assert!(store.raw_entry(key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_positive_ttl_is_immediate_miss() {
        let store = test_store().await;
        store
            .set("safety_score_9", Category::SafetyScore, &json!({"score": 1}), 0)
            .await
            .unwrap();

        let cached = store.get("safety_score_9", Category::SafetyScore).await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_and_resets_access_count() {
        let store = test_store().await;
        let key = "ai_analysis_55_user_1";

        store
            .set(key, Category::AiAnalysis, &json!({"answer": "old"}), 12)
            .await
            .unwrap();
        store.get(key, Category::AiAnalysis).await.unwrap();
        store.get(key, Category::AiAnalysis).await.unwrap();

        let before = store.raw_entry(key).await.unwrap().unwrap();
        assert_eq!(before.access_count, 2);

        store
            .set(key, Category::AiAnalysis, &json!({"answer": "new"}), 12)
            .await
            .unwrap();

        let after = store.raw_entry(key).await.unwrap().unwrap();
        assert_eq!(after.access_count, 0, "overwrite must reset statistics");
        assert!(after.last_accessed.is_none());

        let cached = store.get(key, Category::AiAnalysis).await.unwrap().unwrap();
        assert_eq!(cached["answer"], "new");
    }

    #[tokio::test]
    async fn test_access_accounting() {
        let store = test_store().await;
        let key = "complete_analysis_777";
        store
            .set(key, Category::CompleteAnalysis, &json!({"v": 1}), 6)
            .await
            .unwrap();

        let mut previous_accessed = None;
        for expected in 1..=3i64 {
            store.get(key, Category::CompleteAnalysis).await.unwrap();
            let row = store.raw_entry(key).await.unwrap().unwrap();
            assert_eq!(row.access_count, expected);
            assert!(row.last_accessed >= previous_accessed);
            previous_accessed = row.last_accessed;
        }
    }

    #[tokio::test]
    async fn test_clear_expired_counts_rows() {
        let store = test_store().await;
        store
            .set("product_info_1", Category::ProductInfo, &json!(1), 24)
            .await
            .unwrap();
        store
            .set("product_info_2", Category::ProductInfo, &json!(2), 24)
            .await
            .unwrap();
        store
            .set("product_info_3", Category::ProductInfo, &json!(3), 24)
            .await
            .unwrap();
        store.force_expire("product_info_1").await.unwrap();
        store.force_expire("product_info_2").await.unwrap();

        let removed = store.clear_expired().await.unwrap();
        assert_eq!(removed, 2);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = test_store().await;
        store
            .set("product_info_1", Category::ProductInfo, &json!(1), 24)
            .await
            .unwrap();
        store
            .set("safety_score_1", Category::SafetyScore, &json!(2), 48)
            .await
            .unwrap();

        let removed = store.clear_all().await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.stats().await.unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_delete_by_prefix_scope() {
        let store = test_store().await;
        store
            .set("product_info_123", Category::ProductInfo, &json!(1), 24)
            .await
            .unwrap();
        store
            .set("product_info_123_user_4", Category::ProductInfo, &json!(2), 24)
            .await
            .unwrap();
        store
            .set("product_info_999", Category::ProductInfo, &json!(3), 24)
            .await
            .unwrap();

        let removed = store.delete_by_prefix("product_info_123").await.unwrap();
        assert_eq!(removed, 2);

        let survivor = store.get("product_info_999", Category::ProductInfo).await.unwrap();
        assert!(survivor.is_some());
    }

    #[tokio::test]
    async fn test_stats_consistency() {
        let store = test_store().await;
        for i in 0..5 {
            store
                .set(
                    &format!("barcode_lookup_{}", i),
                    Category::BarcodeLookup,
                    &json!(i),
                    24,
                )
                .await
                .unwrap();
        }
        store.force_expire("barcode_lookup_0").await.unwrap();
        store.force_expire("barcode_lookup_1").await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_entries, 5);
        assert_eq!(stats.expired_entries, 2);
        assert_eq!(stats.active_entries, 3);
    }

    #[tokio::test]
    async fn test_category_stats_include_empty_categories() {
        let store = test_store().await;
        store
            .set("safety_score_1", Category::SafetyScore, &json!(1), 48)
            .await
            .unwrap();

        let by_category = store.category_stats().await.unwrap();
        assert_eq!(by_category.len(), Category::ALL.len());
        assert_eq!(by_category["safety_score"].total, 1);
        assert_eq!(by_category["complete_analysis"].total, 0);
    }

    #[tokio::test]
    async fn test_top_entries_ranked_and_bounded() {
        let store = test_store().await;
        for i in 0..4 {
            let key = format!("product_info_{}", i);
            store.set(&key, Category::ProductInfo, &json!(i), 24).await.unwrap();
            // Entry i gets i reads
            for _ in 0..i {
                store.get(&key, Category::ProductInfo).await.unwrap();
            }
        }

        let top = store.top_entries(2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].cache_key, "product_info_3");
        assert_eq!(top[0].access_count, 3);
        assert_eq!(top[1].cache_key, "product_info_2");
    }

    #[tokio::test]
    async fn test_ping() {
        let store = test_store().await;
        store.ping().await.unwrap();
    }
}
