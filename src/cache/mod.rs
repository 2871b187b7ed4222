//! Unified Cache: a three-tier cache in front of the
//! Persistence Store. Tier 1 is in-memory with LRU+byte-budget eviction,
//! Tier 2 is a local persistent key/value map with TTL, Tier 3 is an
//! optional injectable trait with no bundled implementation. Tier 2's
//! on-disk format follows the same write-temp-then-rename idiom used by
//! [`crate::persistence`].

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{CodelensError, Result};

/// A cached value plus its storage bookkeeping. Size is computed once at
/// `put` time via `serde_json::to_vec`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    payload: serde_json::Value,
    stored_at: chrono::DateTime<Utc>,
    ttl_s: Option<u64>,
    size_bytes: u64,
}

impl CacheEntry {
    fn new(payload: serde_json::Value, ttl_s: Option<u64>) -> Result<Self> {
        let size_bytes = serde_json::to_vec(&payload)?.len() as u64;
        Ok(Self {
            payload,
            stored_at: Utc::now(),
            ttl_s,
            size_bytes,
        })
    }

    fn is_expired(&self) -> bool {
        match self.ttl_s {
            Some(ttl) => Utc::now().signed_duration_since(self.stored_at).num_seconds() as u64 > ttl,
            None => false,
        }
    }
}

/// Hit/miss/eviction counters, one set per tier.
#[derive(Debug, Default)]
pub struct TierStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl TierStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }
    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
    fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Hits recorded so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
    /// Misses recorded so far.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
    /// Evictions recorded so far.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
    /// Hit rate in `[0, 1]`; `0.0` when no reads have occurred yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

/// Snapshot of all tiers' statistics, for reporting.
#[derive(Debug, Default)]
pub struct CacheStatistics {
    /// Tier 1 (in-memory) counters.
    pub tier1: TierStats,
    /// Tier 2 (local persistent) counters.
    pub tier2: TierStats,
    /// Tier 3 (optional distributed) counters, zeroed if no Tier 3 is wired.
    pub tier3: TierStats,
}

/// Object-safe seam for an optional Tier 3 distributed cache. No bundled
/// implementation ships in this crate.
#[async_trait::async_trait]
pub trait RemoteCacheTier: Send + Sync {
    /// Fetch a value by key, if present and unexpired on the remote side.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    /// Store a value by key.
    async fn put(&self, key: &str, value: &serde_json::Value, ttl_s: Option<u64>) -> Result<()>;
}

struct Tier1 {
    lru: Mutex<LruCache<String, CacheEntry>>,
    max_bytes: u64,
    used_bytes: AtomicU64,
    stats: TierStats,
}

impl Tier1 {
    fn new(max_bytes: u64) -> Self {
        Self {
            lru: Mutex::new(LruCache::new(NonZeroUsize::new(usize::MAX).unwrap())),
            max_bytes,
            used_bytes: AtomicU64::new(0),
            stats: TierStats::default(),
        }
    }

    fn get(&self, key: &str) -> Option<CacheEntry> {
        let mut lru = self.lru.lock();
        match lru.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.stats.record_hit();
                Some(entry.clone())
            }
            Some(_) => {
                let evicted = lru.pop(key);
                if let Some(e) = evicted {
                    self.used_bytes.fetch_sub(e.size_bytes, Ordering::Relaxed);
                }
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn put(&self, key: String, entry: CacheEntry) {
        let mut lru = self.lru.lock();
        if let Some(old) = lru.peek(&key) {
            self.used_bytes.fetch_sub(old.size_bytes, Ordering::Relaxed);
        }
        self.used_bytes.fetch_add(entry.size_bytes, Ordering::Relaxed);
        lru.put(key, entry);

        while self.used_bytes.load(Ordering::Relaxed) > self.max_bytes {
            match lru.pop_lru() {
                Some((_, evicted)) => {
                    self.used_bytes.fetch_sub(evicted.size_bytes, Ordering::Relaxed);
                    self.stats.record_eviction();
                }
                None => break,
            }
        }
    }
}

/// Tier 2: a local persistent key/value map serialized as one JSON file per
/// namespace, written atomically (write-temp-then-rename, matching
/// [`crate::persistence`]'s durability contract).
struct Tier2 {
    root: PathBuf,
    stats: TierStats,
}

impl Tier2 {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            stats: TierStats::default(),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(key.as_bytes());
        self.root.join(format!("{digest:x}.json"))
    }

    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);
        if !path.exists() {
            self.stats.record_miss();
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| CodelensError::cache_unavailable(2, e.to_string()))?;
        let entry: CacheEntry =
            serde_json::from_str(&contents).map_err(|e| CodelensError::cache_unavailable(2, e.to_string()))?;
        if entry.is_expired() {
            let _ = std::fs::remove_file(&path);
            self.stats.record_miss();
            return Ok(None);
        }
        self.stats.record_hit();
        Ok(Some(entry))
    }

    fn put(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| CodelensError::cache_unavailable(2, e.to_string()))?;
        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        let serialized = serde_json::to_vec_pretty(entry).map_err(|e| CodelensError::cache_unavailable(2, e.to_string()))?;
        std::fs::write(&tmp_path, &serialized).map_err(|e| CodelensError::cache_unavailable(2, e.to_string()))?;
        std::fs::rename(&tmp_path, &path).map_err(|e| CodelensError::cache_unavailable(2, e.to_string()))?;
        Ok(())
    }
}

/// The three-tier cache façade. Construct one per process and
/// share it across the orchestrator's file/codebase analysis paths.
pub struct UnifiedCache {
    tier1: Tier1,
    tier2: Tier2,
    tier3: Option<Box<dyn RemoteCacheTier>>,
    default_ttl_s: u64,
    stats: CacheStatistics,
}

impl UnifiedCache {
    /// Construct a cache backed by `tier2_root` on disk, with the given
    /// Tier 1 byte budget and default TTL.
    pub fn new(tier2_root: impl Into<PathBuf>, tier1_max_bytes: u64, default_ttl_s: u64) -> Self {
        Self {
            tier1: Tier1::new(tier1_max_bytes),
            tier2: Tier2::new(tier2_root.into()),
            tier3: None,
            default_ttl_s,
            stats: CacheStatistics::default(),
        }
    }

    /// Wire in an optional Tier 3 distributed cache implementation.
    pub fn with_tier3(mut self, tier3: Box<dyn RemoteCacheTier>) -> Self {
        self.tier3 = Some(tier3);
        self
    }

    /// Read a value, checking tiers in order and promoting on a lower-tier
    /// hit (Tier 2 hit promotes to Tier 1; Tier 3 hit promotes to both).
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        if let Some(entry) = self.tier1.get(key) {
            self.stats.tier1.record_hit();
            return Ok(Some(serde_json::from_value(entry.payload)?));
        }
        self.stats.tier1.record_miss();

        match self.tier2.get(key) {
            Ok(Some(entry)) => {
                self.stats.tier2.record_hit();
                self.tier1.put(key.to_string(), entry.clone());
                return Ok(Some(serde_json::from_value(entry.payload)?));
            }
            Ok(None) => self.stats.tier2.record_miss(),
            Err(_) => self.stats.tier2.record_miss(), // degraded tier is a miss, never a failure
        }

        if let Some(tier3) = &self.tier3 {
            match tier3.get(key).await {
                Ok(Some(value)) => {
                    self.stats.tier3.record_hit();
                    let entry = CacheEntry::new(value.clone(), Some(self.default_ttl_s))?;
                    self.tier1.put(key.to_string(), entry.clone());
                    let _ = self.tier2.put(key, &entry);
                    return Ok(Some(serde_json::from_value(value)?));
                }
                Ok(None) => self.stats.tier3.record_miss(),
                Err(_) => self.stats.tier3.record_miss(),
            }
        }

        Ok(None)
    }

    /// Write a value to every wired tier. Tier 2/3 failures are logged and
    /// otherwise swallowed: cache writes never fail the caller.
    pub async fn put<T>(&self, key: &str, value: &T, ttl_s: Option<u64>) -> Result<()>
    where
        T: serde::Serialize,
    {
        let payload = serde_json::to_value(value)?;
        let ttl = ttl_s.or(Some(self.default_ttl_s));
        let entry = CacheEntry::new(payload.clone(), ttl)?;

        self.tier1.put(key.to_string(), entry.clone());

        if let Err(e) = self.tier2.put(key, &entry) {
            tracing::warn!(key, error = %e, "tier 2 cache write failed, continuing");
        }

        if let Some(tier3) = &self.tier3 {
            if let Err(e) = tier3.put(key, &payload, ttl).await {
                tracing::warn!(key, error = %e, "tier 3 cache write failed, continuing");
            }
        }

        Ok(())
    }

    /// Statistics across all tiers.
    pub fn stats(&self) -> &CacheStatistics {
        &self.stats
    }

    /// Store process/session-scoped state under a namespace with no TTL,
    /// distinct from content-addressed analysis entries.
    pub async fn put_session_state<T: serde::Serialize>(&self, session_key: &str, value: &T) -> Result<()> {
        self.put(&session_namespaced(session_key), value, None).await
    }

    /// Fetch session-scoped state previously written with
    /// [`Self::put_session_state`].
    pub async fn get_session_state<T: serde::de::DeserializeOwned>(&self, session_key: &str) -> Result<Option<T>> {
        self.get(&session_namespaced(session_key)).await
    }
}

fn session_namespaced(key: &str) -> String {
    format!("session:{key}")
}

/// Build the default Tier 2 root under a persistence root, co-locating
/// the cache's durable tier beside the Persistence Store.
pub fn default_tier2_root(persistence_root: impl AsRef<Path>) -> PathBuf {
    persistence_root.as_ref().join("cache")
}
