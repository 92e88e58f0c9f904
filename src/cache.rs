//! Key/value cache used for warmed analysis results.
//!
//! The engine only relies on the [`CacheStore`] get/set contract; any shared
//! cache (Redis, memcached, ...) can stand behind it. [`MokaCacheStore`] is the
//! in-process implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::error::Result;

/// String-valued cache with per-entry time-to-live.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a live value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: String,
    ttl: Duration,
}

/// Expiry policy reading each entry's own TTL.
struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Statistics for the in-process cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entry_count: u64,
    pub hits: u64,
    pub misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
    pub max_capacity: u64,
}

/// In-process [`CacheStore`] backed by moka.
pub struct MokaCacheStore {
    cache: Cache<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    max_capacity: u64,
}

impl MokaCacheStore {
    /// Create a cache from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_capacity(config.max_entries)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();

        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            max_capacity,
        }
    }

    /// Remove a single entry.
    pub async fn remove(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Clear all entries and counters.
    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            entry_count: self.cache.entry_count(),
            hits,
            misses,
            hit_rate,
            max_capacity: self.max_capacity,
        }
    }
}

impl Default for MokaCacheStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.cache.get(key).await {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.payload))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.cache
            .insert(key.to_string(), CacheEntry { payload: value, ttl })
            .await;
        Ok(())
    }
}
