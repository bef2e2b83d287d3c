//! Resolution cache
//!
//! A keyed store for resolved templates (or any serializable value) with a
//! pluggable eviction policy, per-entry TTL, tags, integrity checksums and an
//! optional disk mirror. All in-memory operations are synchronous and total;
//! only [`ResolutionCache::flush`] and [`ResolutionCache::load`] touch the
//! disk and report failures.
//!
//! Mutations are mirrored to disk by a single writer task per cache, started
//! on the current tokio runtime the first time it is needed. Disk operations
//! land in the order the mutations happened.

pub mod config;
pub mod entry;
pub mod persistence;
pub mod stats;


use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

pub use config::{CacheConfig, EvictionPolicy, PersistenceConfig};
pub use entry::{CacheEntry, EntryOptions};
pub use stats::CacheStats;

use crate::core::{Result, TemplateError};

/// Entry bookkeeping without the value, as produced by [`ResolutionCache::export`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub key: String,
    pub checksum: String,
    pub timestamp: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub hits: u64,
    #[serde(default)]
    pub ttl_ms: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Metadata-only view of a cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub exported_at: DateTime<Utc>,
    pub policy: EvictionPolicy,
    pub stats: CacheStats,
    pub entries: Vec<EntrySummary>,
}

/// Bounded cache keyed by raw template text
///
/// # Examples
///
/// ```rust
/// use ptf_template::cache::{CacheConfig, EvictionPolicy, ResolutionCache};
///
/// let mut cache = ResolutionCache::new(CacheConfig::new(2, EvictionPolicy::Lru));
/// cache.set("a", "1".to_string());
/// cache.set("b", "2".to_string());
/// cache.get("a");
/// cache.set("c", "3".to_string());
/// assert!(cache.has("a"));
/// assert!(!cache.has("b"));
/// ```
#[derive(Debug)]
pub struct ResolutionCache<V = String> {
    config: CacheConfig,
    entries: HashMap<String, CacheEntry<V>>,
    /// Eviction order, front first. Insertion order for every policy;
    /// LRU also moves a key to the back when it is read.
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
    evictions: u64,
    writer: Option<mpsc::UnboundedSender<DiskOp<V>>>,
}

/// Queued disk mirror operation
enum DiskOp<V> {
    Write(CacheEntry<V>),
    Remove(String),
    Clear,
    /// Answered once every earlier operation has been applied
    Sync(oneshot::Sender<()>),
}

impl<V> ResolutionCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::with_capacity(config.max_size.min(1024)),
            order: VecDeque::new(),
            config,
            hits: 0,
            misses: 0,
            evictions: 0,
            writer: None,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.set_with(key, value, EntryOptions::default());
    }

    /// Insert or replace `key`, evicting first when a new key would overflow
    pub fn set_with(&mut self, key: impl Into<String>, value: V, options: EntryOptions) {
        let key = key.into();
        if self.config.max_size == 0 {
            return;
        }

        if self.entries.contains_key(&key) {
            self.forget(&key);
        } else {
            while self.entries.len() >= self.config.max_size {
                if !self.evict_one() {
                    break;
                }
            }
        }

        let mut entry = CacheEntry::new(key.clone(), value);
        entry.ttl_ms = options
            .ttl
            .or(self.config.default_ttl)
            .map(|ttl| ttl.as_millis().min(u64::MAX as u128) as u64);
        entry.tags = options.tags;
        entry.metadata = options.metadata;

        if self.config.persistence.is_some() {
            self.persist(DiskOp::Write(entry.clone()));
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, entry);
    }

    /// Value for `key`, counting a hit or a miss; expired entries are dropped here
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(),
        };
        if expired {
            trace!("cache entry {key:?} expired");
            self.remove(key);
            self.misses += 1;
            return None;
        }

        self.hits += 1;
        if self.config.policy == EvictionPolicy::Lru {
            self.promote(key);
        }
        let entry = self.entries.get_mut(key)?;
        entry.touch();
        Some(entry.value.clone())
    }

    /// Read without touching statistics, access order or expiry
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Full entry, bookkeeping included
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Present and not expired
    pub fn has(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|entry| !entry.is_expired())
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.remove(key).is_some()
    }

    /// Drop every entry and reset the counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
        self.persist(DiskOp::Clear);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in eviction order, next victim first
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    /// Remove every entry carrying `tag`
    pub fn invalidate_tag(&mut self, tag: &str) -> usize {
        let tagged: Vec<String> = self
            .order
            .iter()
            .filter(|key| {
                self.entries
                    .get(*key)
                    .is_some_and(|entry| entry.tags.iter().any(|t| t == tag))
            })
            .cloned()
            .collect();
        for key in &tagged {
            self.remove(key);
        }
        debug!("invalidated {} cache entries tagged {tag:?}", tagged.len());
        tagged.len()
    }

    /// Remove every expired entry now instead of waiting for a `get`
    pub fn prune_expired(&mut self) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    /// Whether the stored checksum still matches the value; false for a missing key
    pub fn verify_integrity(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(CacheEntry::is_intact)
    }

    /// Like [`verify_integrity`](Self::verify_integrity), but a mismatch is an error.
    /// A missing key passes.
    pub fn check_integrity(&self, key: &str) -> Result<()> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_intact() => Err(TemplateError::cache_corruption(key)),
            _ => Ok(()),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_size: self.config.max_size,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate: CacheStats::hit_rate(self.hits, self.misses),
        }
    }

    /// Bookkeeping for every entry, in eviction order; values are not included
    pub fn export(&self) -> CacheSnapshot {
        let entries = self
            .order
            .iter()
            .filter_map(|key| self.entries.get(key))
            .map(|entry| EntrySummary {
                key: entry.key.clone(),
                checksum: entry.checksum.clone(),
                timestamp: entry.timestamp,
                last_access: entry.last_access,
                hits: entry.hits,
                ttl_ms: entry.ttl_ms,
                tags: entry.tags.clone(),
                metadata: entry.metadata.clone(),
            })
            .collect();
        CacheSnapshot {
            exported_at: Utc::now(),
            policy: self.config.policy,
            stats: self.stats(),
            entries,
        }
    }

    /// Apply snapshot bookkeeping to entries with the same key and checksum
    ///
    /// Returns how many entries were updated. Values are never restored.
    pub fn import(&mut self, snapshot: &CacheSnapshot) -> usize {
        let mut applied = 0;
        for summary in &snapshot.entries {
            let Some(entry) = self.entries.get_mut(&summary.key) else {
                continue;
            };
            if entry.checksum != summary.checksum {
                debug!("snapshot checksum differs for {:?}; skipped", summary.key);
                continue;
            }
            entry.hits = summary.hits;
            entry.last_access = summary.last_access;
            entry.tags = summary.tags.clone();
            entry.metadata = summary.metadata.clone();
            applied += 1;
        }
        applied
    }

    /// Wait until every queued disk operation has been applied
    ///
    /// Returns at once when nothing was ever queued.
    pub async fn sync(&self) {
        let Some(writer) = &self.writer else {
            return;
        };
        let (done, applied) = oneshot::channel();
        if writer.send(DiskOp::Sync(done)).is_ok() {
            // An error means the writer stopped with its runtime
            let _ = applied.await;
        }
    }

    /// Write every entry to disk; returns how many files were written
    ///
    /// Queued operations land first. Individual write failures are logged
    /// and skipped. Without a persistence directory this is a no-op.
    pub async fn flush(&self) -> Result<usize> {
        let Some(disk) = &self.config.persistence else {
            return Ok(0);
        };
        self.sync().await;
        tokio::fs::create_dir_all(&disk.directory)
            .await
            .map_err(|e| {
                TemplateError::persistence(disk.directory.display().to_string(), e.to_string())
            })?;

        let mut written = 0;
        for key in &self.order {
            let Some(entry) = self.entries.get(key) else {
                continue;
            };
            match persistence::write_entry(disk, entry).await {
                Ok(()) => written += 1,
                Err(error) => warn!("cache flush: {error}"),
            }
        }
        debug!("flushed {written} cache entries to {}", disk.directory.display());
        Ok(written)
    }

    /// Read every persisted entry into memory; returns how many were loaded
    ///
    /// Expired files are deleted instead of loaded. Loaded entries respect
    /// capacity and are not written back.
    pub async fn load(&mut self) -> Result<usize> {
        let Some(disk) = self.config.persistence.clone() else {
            return Ok(0);
        };
        self.sync().await;
        let mut loaded = 0;
        for (path, entry) in persistence::read_entries::<V>(&disk).await? {
            if entry.is_expired() {
                trace!("dropping expired cache file {}", path.display());
                if let Err(error) = persistence::delete_path(&path).await {
                    warn!("cache load: {error}");
                }
                continue;
            }
            if !entry.is_intact() {
                warn!("cache file {} has a checksum mismatch", path.display());
            }
            self.insert_loaded(entry);
            loaded += 1;
        }
        debug!("loaded {loaded} cache entries from {}", disk.directory.display());
        Ok(loaded)
    }

    fn insert_loaded(&mut self, entry: CacheEntry<V>) {
        if self.config.max_size == 0 {
            return;
        }
        if self.entries.contains_key(&entry.key) {
            self.forget(&entry.key);
        } else {
            while self.entries.len() >= self.config.max_size {
                if !self.evict_one() {
                    break;
                }
            }
        }
        self.order.push_back(entry.key.clone());
        self.entries.insert(entry.key.clone(), entry);
    }

    /// Pick a victim per policy and drop it; false when the cache is empty
    fn evict_one(&mut self) -> bool {
        let victim = match self.config.policy {
            EvictionPolicy::Lru | EvictionPolicy::Fifo => self.order.front().cloned(),
            // `min_by_key` keeps the first minimum, so ties go to the earliest inserted
            EvictionPolicy::Lfu => self
                .order
                .iter()
                .filter_map(|key| self.entries.get(key))
                .min_by_key(|entry| entry.hits)
                .map(|entry| entry.key.clone()),
            EvictionPolicy::Ttl => self
                .order
                .iter()
                .filter_map(|key| self.entries.get(key))
                .min_by_key(|entry| entry.last_access)
                .map(|entry| entry.key.clone()),
        };
        match victim {
            Some(key) => {
                trace!("evicting {key:?} ({:?})", self.config.policy);
                self.remove(&key);
                self.evictions += 1;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.forget(key)?;
        self.persist(DiskOp::Remove(key.to_string()));
        Some(entry)
    }

    /// Drop from memory only
    fn forget(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        if let Some(position) = self.order.iter().position(|k| k == key) {
            self.order.remove(position);
        }
        Some(entry)
    }

    fn promote(&mut self, key: &str) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            if let Some(key) = self.order.remove(position) {
                self.order.push_back(key);
            }
        }
    }

    /// Queue `op` for the disk writer, starting it on the current runtime if needed
    fn persist(&mut self, op: DiskOp<V>) {
        let Some(disk) = &self.config.persistence else {
            return;
        };
        let writer = match self.writer.take() {
            Some(writer) if !writer.is_closed() => writer,
            _ => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let (writer, ops) = mpsc::unbounded_channel();
                    handle.spawn(apply_disk_ops(disk.clone(), ops));
                    writer
                }
                Err(_) => {
                    trace!("no tokio runtime; skipping background cache persistence");
                    return;
                }
            },
        };
        if writer.send(op).is_err() {
            warn!("cache writer stopped; dropped a disk operation");
        }
        self.writer = Some(writer);
    }
}

impl<V> Default for ResolutionCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Apply disk operations one at a time, in the order they were queued
async fn apply_disk_ops<V: Serialize>(
    disk: PersistenceConfig,
    mut ops: mpsc::UnboundedReceiver<DiskOp<V>>,
) {
    while let Some(op) = ops.recv().await {
        let outcome = match op {
            DiskOp::Write(entry) => persistence::write_entry(&disk, &entry).await,
            DiskOp::Remove(key) => persistence::remove_entry(&disk, &key).await,
            DiskOp::Clear => persistence::clear_directory(&disk).await.map(|_| ()),
            DiskOp::Sync(done) => {
                let _ = done.send(());
                Ok(())
            }
        };
        if let Err(error) = outcome {
            warn!("cache persistence: {error}");
        }
    }
    trace!("cache writer for {} stopped", disk.directory.display());
}
