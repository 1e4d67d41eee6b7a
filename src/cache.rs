//! Content-addressed cache for per-chunk analysis results.
//!
//! Ingestion re-processes documents whenever a corpus is re-uploaded;
//! keying analysis results by a SHA-256 digest of the chunk content makes
//! that re-processing free when the content has not changed.
//!
//! Eviction is explicit and bounded: least-recently-accessed entries are
//! dropped once `max_entries` is reached, and entries older than `ttl`
//! expire on next access. Without the bound the cache grows with every
//! corpus version ever ingested.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

/// Configuration for the content cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before eviction.
    pub max_entries: usize,
    /// Time-to-live for entries.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl CacheConfig {
    /// Create a config with the given capacity.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            ..Default::default()
        }
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// SHA-256 digest of chunk content, the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Digest a piece of content.
    pub fn of(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hex representation of the digest.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    created_at: Instant,
    last_access: Instant,
}

impl<T: Clone> CacheEntry<T> {
    fn new(value: T) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            last_access: now,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }

    fn access(&mut self) -> T {
        self.last_access = Instant::now();
        self.value.clone()
    }
}

/// Cache hit/miss counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of lookups served from the cache.
    pub hits: usize,
    /// Number of lookups that missed (absent or expired).
    pub misses: usize,
    /// Number of entries evicted for capacity.
    pub evictions: usize,
}

impl CacheStats {
    /// Hit rate in [0, 1]; zero when no lookups have happened.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Content-addressed cache: SHA-256 digest → analysis value.
///
/// Shared read-mostly across concurrent ingestion tasks; interior
/// mutability via an async `RwLock`.
pub struct ContentCache<T> {
    config: CacheConfig,
    entries: RwLock<HashMap<ContentDigest, CacheEntry<T>>>,
    stats: RwLock<CacheStats>,
}

impl<T: Clone> ContentCache<T> {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Look up the cached value for a digest.
    ///
    /// Expired entries are removed and counted as misses.
    pub async fn get(&self, digest: &ContentDigest) -> Option<T> {
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        match entries.get_mut(digest) {
            Some(entry) if !entry.is_expired(self.config.ttl) => {
                stats.hits += 1;
                Some(entry.access())
            }
            Some(_) => {
                entries.remove(digest);
                stats.misses += 1;
                None
            }
            None => {
                stats.misses += 1;
                None
            }
        }
    }

    /// Look up by raw content, digesting it first.
    pub async fn get_by_content(&self, content: &str) -> Option<T> {
        self.get(&ContentDigest::of(content)).await
    }

    /// Insert a value, evicting the least-recently-accessed entry if at
    /// capacity.
    pub async fn insert(&self, digest: ContentDigest, value: T) {
        let mut entries = self.entries.write().await;

        if entries.len() >= self.config.max_entries && !entries.contains_key(&digest) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone())
            {
                debug!(digest = oldest.as_hex(), "evicting least-recently-used entry");
                entries.remove(&oldest);
                self.stats.write().await.evictions += 1;
            }
        }

        entries.insert(digest, CacheEntry::new(value));
    }

    /// Insert keyed by raw content.
    pub async fn insert_by_content(&self, content: &str, value: T) {
        self.insert(ContentDigest::of(content), value).await;
    }

    /// Current number of live entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of hit/miss counters.
    pub async fn stats(&self) -> CacheStats {
        *self.stats.read().await
    }

    /// Drop all entries and reset counters.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        *self.stats.write().await = CacheStats::default();
    }
}

impl<T: Clone> Default for ContentCache<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
