//! Disk-backed LRU Cache
//!
//! [`DiskCache`] stores byte payloads as flat files under one directory and
//! keeps the sum of their sizes within a fixed byte budget, evicting the least
//! recently used files first.
//!
//! # Data Flow
//!
//! ```text
//!   set(key, data) ─▶ encode ─▶ evict until it fits ─▶ write file ─▶ index insert
//!   get(key)       ─▶ encode ─▶ index touch ─▶ read file ─▶ hit │ self-heal + miss
//!   del(key)       ─▶ encode ─▶ delete file ─▶ index remove
//! ```
//!
//! # Locking
//!
//! One `parking_lot::RwLock` guards the recency index and the counters.
//!
//! - `set` holds the write lock across eviction, the file write and the index
//!   insert, so two writers can never both see room for their payload.
//! - `get` takes the write lock to promote the entry, releases it while the
//!   file is read, and takes it again to record the outcome. An entry that
//!   turns out to have lost its file is dropped only if it is still the same
//!   entry (same generation) that was promoted.
//! - Accessors take the read lock.
//!
//! # Restart
//!
//! Construction rebuilds the index from the directory. Recency is not
//! persisted, so the rebuilt order is directory traversal order. Files that
//! are empty, larger than the budget, or named so that no key maps to them
//! are left on disk and not indexed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::config::DiskCacheConfig;
use crate::encoding::KeyEncoding;
use crate::error::{Error, Result, SetError};
use crate::index::RecencyIndex;
use crate::metrics::{CacheMetrics, CoreCacheMetrics};
use crate::store::FileStore;

struct State {
    index: RecencyIndex,
    metrics: CoreCacheMetrics,
}

/// A size-bounded LRU cache of byte payloads persisted as files.
///
/// All methods take `&self`; share the cache between threads with an `Arc`.
///
/// # Examples
///
/// ```
/// use disk_cache_rs::DiskCache;
///
/// let dir = tempfile::tempdir().unwrap();
/// let cache = DiskCache::new(dir.path(), 16).unwrap();
///
/// cache.set("/a", b"12345678");
/// cache.set("/b", b"12345678");
/// cache.get("/a");                 // "/a" becomes most recently used
/// cache.set("/c", b"12345678");    // "/b" is evicted
///
/// assert!(cache.get("/b").is_none());
/// assert_eq!(cache.get("/a").as_deref(), Some(&b"12345678"[..]));
/// assert_eq!(cache.eviction_count(), 1);
/// ```
pub struct DiskCache {
    state: RwLock<State>,
    store: FileStore,
    max_size: u64,
    key_encoding: KeyEncoding,
}

impl DiskCache {
    /// Opens a cache over `base_dir` with a budget of `max_size` bytes and
    /// default settings.
    pub fn new(base_dir: impl Into<PathBuf>, max_size: u64) -> Result<Self> {
        Self::init(DiskCacheConfig::new(base_dir, max_size))
    }

    /// Opens a cache from a configuration.
    ///
    /// Creates the directory if needed, removes leftover temporary files and
    /// indexes every regular file that fits the budget. If the indexed files
    /// exceed the budget, the oldest (in traversal order) are evicted.
    ///
    /// Some files are left on disk but not indexed:
    ///
    /// - empty files, since `set` never stores an empty payload
    /// - files larger than `max_size`
    /// - files whose name no key encodes to under `key_encoding`, such as
    ///   `@@afa@afa` or `a+b` with percent encoding
    pub fn init(config: DiskCacheConfig) -> Result<Self> {
        let DiskCacheConfig {
            base_dir,
            max_size,
            key_encoding,
            atomic_writes,
        } = config;

        let store = FileStore::open(&base_dir, atomic_writes).map_err(|source| {
            Error::CreateDir {
                path: base_dir.clone(),
                source,
            }
        })?;
        let files = store.scan().map_err(|source| Error::ScanDir {
            path: base_dir.clone(),
            source,
        })?;

        let mut index = RecencyIndex::new();
        for (name, size) in files {
            if FileStore::is_temp_name(&name) {
                trace!(name = %name, "removing leftover temporary file");
                if let Err(err) = store.delete(&name) {
                    warn!(name = %name, error = %err, "failed to remove temporary file");
                }
                continue;
            }
            if size == 0 || size > max_size {
                debug!(name = %name, size, max_size, "not indexing cache file");
                continue;
            }
            if !key_encoding.is_reachable(&name) {
                debug!(name = %name, encoding = ?key_encoding, "not indexing foreign file name");
                continue;
            }
            let key = key_encoding.decode(&name);
            index.add(&name, key.as_deref(), size);
        }

        let cache = Self {
            state: RwLock::new(State {
                index,
                metrics: CoreCacheMetrics::new(max_size),
            }),
            store,
            max_size,
            key_encoding,
        };

        {
            let mut state = cache.state.write();
            while state.index.size() > max_size {
                if !cache.evict_oldest(&mut state) {
                    break;
                }
            }
            debug!(
                dir = %base_dir.display(),
                entries = state.index.len(),
                size = state.index.size(),
                max_size,
                "opened disk cache"
            );
        }

        Ok(cache)
    }

    /// Stores `data` under `key`, replacing any previous value.
    ///
    /// Rejections (empty payload, payload over budget, unusable key, write
    /// failure) are logged and otherwise ignored; use [`try_set`](Self::try_set)
    /// to observe them.
    pub fn set(&self, key: &str, data: &[u8]) {
        match self.try_set(key, data) {
            Ok(()) => {}
            Err(err @ SetError::Write { .. }) => {
                warn!(key = %key, error = %err, "cache write rejected");
            }
            Err(err) => {
                debug!(key = %key, error = %err, "cache write rejected");
            }
        }
    }

    /// Stores `data` under `key`, reporting why it was not cached.
    ///
    /// On failure the cache holds no entry for `key` afterwards, even if it
    /// held one before.
    pub fn try_set(&self, key: &str, data: &[u8]) -> std::result::Result<(), SetError> {
        if data.is_empty() {
            return Err(SetError::EmptyValue);
        }
        let name = self.key_encoding.encode(key).ok_or(SetError::InvalidKey)?;
        let size = data.len() as u64;
        if size > self.max_size {
            return Err(SetError::TooLarge {
                size,
                max_size: self.max_size,
            });
        }

        let mut state = self.state.write();

        // An overwrite replaces the old size rather than adding to it.
        state.index.remove(&name);
        while state.index.size() + size > self.max_size {
            if !self.evict_oldest(&mut state) {
                break;
            }
        }

        if let Err(source) = self.store.write(&name, data) {
            if let Err(err) = self.store.delete(&name) {
                warn!(name = %name, error = %err, "failed to clean up after write error");
            }
            return Err(SetError::Write { name, source });
        }

        state.index.add(&name, Some(key), size);
        state.metrics.record_insertion(size);
        trace!(name = %name, size, total = state.index.size(), "cached entry");
        Ok(())
    }

    /// Returns the payload stored under `key` and marks it most recently used.
    ///
    /// An entry whose file has disappeared is dropped from the index and
    /// reported as a miss.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let Some(name) = self.key_encoding.encode(key) else {
            self.state.write().metrics.record_miss();
            return None;
        };

        let generation = {
            let mut state = self.state.write();
            let promoted = if state.index.touch(&name) {
                state.index.peek(&name).map(|entry| entry.generation())
            } else {
                None
            };
            match promoted {
                Some(generation) => generation,
                None => {
                    state.metrics.record_miss();
                    return None;
                }
            }
        };

        match self.store.read(&name) {
            Ok(data) => {
                self.state.write().metrics.record_hit(data.len() as u64);
                Some(data)
            }
            Err(err) => {
                let mut state = self.state.write();
                if let Some(size) = state.index.remove_if_generation(&name, generation) {
                    debug!(name = %name, size, error = %err, "dropped stale cache entry");
                    if err.kind() != std::io::ErrorKind::NotFound {
                        if let Err(err) = self.store.delete(&name) {
                            warn!(name = %name, error = %err, "failed to delete unreadable cache file");
                        }
                    }
                }
                state.metrics.record_miss();
                None
            }
        }
    }

    /// Removes `key` from the cache. Removing an absent key is a no-op.
    ///
    /// The file is deleted even when the index does not know it, which covers
    /// files skipped at startup.
    pub fn del(&self, key: &str) {
        let Some(name) = self.key_encoding.encode(key) else {
            return;
        };
        let mut state = self.state.write();
        if let Err(err) = self.store.delete(&name) {
            warn!(name = %name, error = %err, "failed to delete cache file");
        }
        if let Some(size) = state.index.remove(&name) {
            trace!(name = %name, size, "deleted cache entry");
        }
    }

    /// Reports whether `key` is indexed, without changing its recency.
    pub fn contains(&self, key: &str) -> bool {
        match self.key_encoding.encode(key) {
            Some(name) => self.state.read().index.contains(&name),
            None => false,
        }
    }

    /// Deletes every indexed file and empties the index.
    ///
    /// Counters are left untouched; cleared entries are not evictions.
    pub fn clear(&self) {
        let mut state = self.state.write();
        for entry in state.index.drain() {
            if let Err(err) = self.store.delete(entry.name()) {
                warn!(name = %entry.name(), error = %err, "failed to delete cache file");
            }
        }
    }

    /// Sum of the sizes of all indexed entries.
    pub fn current_size(&self) -> u64 {
        self.state.read().index.size()
    }

    /// Byte budget fixed at construction.
    #[inline]
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Number of `get` calls that returned a payload.
    pub fn hit_count(&self) -> u64 {
        self.state.read().metrics.cache_hits
    }

    /// Number of `get` calls that returned `None`.
    pub fn miss_count(&self) -> u64 {
        self.state.read().metrics.cache_misses
    }

    /// Number of entries removed to keep within the byte budget.
    pub fn eviction_count(&self) -> u64 {
        self.state.read().metrics.evictions
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    /// Returns true when no entry is indexed.
    pub fn is_empty(&self) -> bool {
        self.state.read().index.is_empty()
    }

    /// Copy of the current counters.
    pub fn stats(&self) -> CoreCacheMetrics {
        self.state.read().metrics.clone()
    }

    /// Directory holding the cache files.
    #[inline]
    pub fn base_dir(&self) -> &Path {
        self.store.base_dir()
    }

    /// Scheme used to turn keys into file names.
    #[inline]
    pub fn key_encoding(&self) -> KeyEncoding {
        self.key_encoding
    }

    fn evict_oldest(&self, state: &mut State) -> bool {
        let Some(entry) = state.index.remove_oldest() else {
            return false;
        };
        if let Err(err) = self.store.delete(entry.name()) {
            warn!(name = %entry.name(), error = %err, "failed to delete evicted cache file");
        }
        state.metrics.record_eviction();
        debug!(
            name = %entry.name(),
            key = entry.key().unwrap_or("<unknown>"),
            size = entry.size(),
            "evicted cache entry"
        );
        true
    }
}

impl CacheMetrics for DiskCache {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let state = self.state.read();
        state.metrics.to_btreemap(state.index.size())
    }

    fn algorithm_name(&self) -> &'static str {
        "DiskLRU"
    }
}

impl core::fmt::Debug for DiskCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.read();
        f.debug_struct("DiskCache")
            .field("base_dir", &self.store.base_dir())
            .field("max_size", &self.max_size)
            .field("current_size", &state.index.size())
            .field("len", &state.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn open(max_size: u64) -> (tempfile::TempDir, DiskCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("cache"), max_size).unwrap();
        (dir, cache)
    }

    #[test]
    fn test_round_trip() {
        let (_dir, cache) = open(1024);
        cache.set("name", b"stormi-li");
        assert_eq!(cache.get("name").as_deref(), Some(&b"stormi-li"[..]));
        assert_eq!(cache.current_size(), 9);
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.miss_count(), 0);
    }

    #[test]
    fn test_file_lands_under_encoded_name() {
        let (_dir, cache) = open(1024);
        cache.set("/img/a.png", b"png");
        let path = cache.base_dir().join("%2Fimg%2Fa.png");
        assert_eq!(fs::read(path).unwrap(), b"png");
    }

    #[test]
    fn test_overwrite_replaces_size() {
        let (_dir, cache) = open(1024);
        cache.set("k", b"0123456789");
        cache.set("k", b"abc");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 3);
        assert_eq!(cache.get("k").as_deref(), Some(&b"abc"[..]));
        assert_eq!(cache.eviction_count(), 0);
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict_others() {
        let (_dir, cache) = open(10);
        cache.set("a", b"12345");
        cache.set("b", b"12345");
        cache.set("b", b"67890");
        assert!(cache.contains("a"));
        assert_eq!(cache.eviction_count(), 0);
        assert_eq!(cache.current_size(), 10);
    }

    #[test]
    fn test_try_set_rejections() {
        let (_dir, cache) = open(4);
        assert!(matches!(cache.try_set("k", b""), Err(SetError::EmptyValue)));
        assert!(matches!(cache.try_set("", b"x"), Err(SetError::InvalidKey)));
        assert!(matches!(
            cache.try_set("k", b"12345"),
            Err(SetError::TooLarge {
                size: 5,
                max_size: 4
            })
        ));
        assert!(cache.is_empty());
        assert!(cache.try_set("k", b"1234").is_ok());
    }

    #[test]
    fn test_write_failure_leaves_no_entry() {
        let (_dir, cache) = open(1024);
        // a directory squatting on the target name makes the write fail
        fs::create_dir(cache.base_dir().join("blocked")).unwrap();
        let err = cache.try_set("blocked", b"data").unwrap_err();
        assert!(matches!(err, SetError::Write { .. }));
        assert!(!cache.contains("blocked"));
        assert_eq!(cache.current_size(), 0);
    }

    #[test]
    fn test_stale_entry_self_heals() {
        let (_dir, cache) = open(1024);
        cache.set("gone", b"12345");
        cache.set("kept", b"678");
        fs::remove_file(cache.base_dir().join("gone")).unwrap();

        assert!(cache.get("gone").is_none());
        assert!(!cache.contains("gone"));
        assert_eq!(cache.current_size(), 3);
        assert_eq!(cache.miss_count(), 1);
        assert_eq!(cache.hit_count(), 0);
    }

    #[test]
    fn test_del_absent_is_noop() {
        let (_dir, cache) = open(1024);
        cache.del("missing");
        cache.set("k", b"v");
        cache.del("k");
        cache.del("k");
        assert!(cache.get("k").is_none());
        assert_eq!(cache.current_size(), 0);
    }

    #[test]
    fn test_del_removes_unindexed_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big"), vec![0u8; 64]).unwrap();
        let cache = DiskCache::new(dir.path(), 16).unwrap();
        assert!(!cache.contains("big"));
        cache.del("big");
        assert!(!dir.path().join("big").exists());
    }

    #[test]
    fn test_clear() {
        let (_dir, cache) = open(1024);
        cache.set("a", b"1");
        cache.set("b", b"2");
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.current_size(), 0);
        assert_eq!(cache.eviction_count(), 0);
        assert!(fs::read_dir(cache.base_dir()).unwrap().next().is_none());
    }

    #[test]
    fn test_metrics_report() {
        let (_dir, cache) = open(100);
        cache.set("a", b"0123456789");
        cache.get("a");
        cache.get("b");
        let metrics = cache.metrics();
        assert_eq!(metrics["requests"], 2.0);
        assert_eq!(metrics["cache_hits"], 1.0);
        assert_eq!(metrics["cache_misses"], 1.0);
        assert_eq!(metrics["cache_size_bytes"], 10.0);
        assert_eq!(metrics["max_cache_size_bytes"], 100.0);
        assert_eq!(metrics["bytes_written_to_cache"], 10.0);
        assert_eq!(cache.algorithm_name(), "DiskLRU");
    }

    #[test]
    fn test_substitute_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let config = DiskCacheConfig {
            key_encoding: KeyEncoding::Substitute,
            ..DiskCacheConfig::new(dir.path(), 1024)
        };
        let cache = DiskCache::init(config).unwrap();
        cache.set("//afa/afa", b"fsfs");
        assert!(dir.path().join("@@afa@afa").is_file());
        assert_eq!(cache.get("//afa/afa").as_deref(), Some(&b"fsfs"[..]));
    }

    #[test]
    fn test_long_key_is_cached() {
        let (_dir, cache) = open(1024);
        let key = "/a".repeat(90);
        assert!(cache.try_set(&key, b"deep").is_ok());
        assert_eq!(cache.get(&key).as_deref(), Some(&b"deep"[..]));
        assert!(cache.get(&"/b".repeat(90)).is_none());
        {
            let name = cache.key_encoding().encode(&key).unwrap();
            let state = cache.state.read();
            assert_eq!(state.index.peek(&name).unwrap().key(), Some(key.as_str()));
        }
        cache.del(&key);
        assert!(cache.is_empty());
        assert!(fs::read_dir(cache.base_dir()).unwrap().next().is_none());
    }

    #[test]
    fn test_substitute_rejects_temp_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let config = DiskCacheConfig {
            key_encoding: KeyEncoding::Substitute,
            ..DiskCacheConfig::new(dir.path(), 1024)
        };
        let cache = DiskCache::init(config).unwrap();

        assert!(matches!(
            cache.try_set("page.%tmp", b"payload"),
            Err(SetError::InvalidKey)
        ));
        cache.set("page", b"other");
        cache.set("page.%tmp", b"payload");

        assert!(cache.get("page.%tmp").is_none());
        assert_eq!(cache.get("page").as_deref(), Some(&b"other"[..]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_construction_fails_when_dir_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain-file");
        fs::write(&file, b"x").unwrap();
        let err = DiskCache::new(file.join("sub"), 10).unwrap_err();
        assert!(matches!(err, Error::CreateDir { .. }));
    }
}
