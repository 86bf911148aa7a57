//! Cache Metrics
//!
//! Counters maintained by [`DiskCache`](crate::DiskCache) and a uniform,
//! BTreeMap-based reporting interface.
//!
//! Counters are monotonically non-decreasing for the lifetime of a cache.
//! They are not persisted; a cache rebuilt from an existing directory starts
//! from zero.
//!
//! BTreeMap is used for reporting so that metrics always come out in the same
//! order, which keeps logs and test expectations stable.

use std::collections::BTreeMap;

/// Counters tracked by the cache engine.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoreCacheMetrics {
    /// Number of `get` calls that resolved to a hit or a miss
    pub requests: u64,

    /// Number of `get` calls served from disk
    pub cache_hits: u64,

    /// Number of `get` calls that found nothing, including stale entries
    pub cache_misses: u64,

    /// Number of entries removed to respect the byte budget
    pub evictions: u64,

    /// Total bytes written into cache files
    pub bytes_written_to_cache: u64,

    /// Total bytes returned by hits
    pub bytes_served_from_cache: u64,

    /// Configured byte budget
    pub max_cache_size_bytes: u64,
}

impl CoreCacheMetrics {
    /// Creates zeroed counters for a cache with the given budget.
    pub fn new(max_cache_size_bytes: u64) -> Self {
        Self {
            max_cache_size_bytes,
            ..Default::default()
        }
    }

    /// Records a hit that returned `object_size` bytes.
    pub fn record_hit(&mut self, object_size: u64) {
        self.requests += 1;
        self.cache_hits += 1;
        self.bytes_served_from_cache += object_size;
    }

    /// Records a miss.
    pub fn record_miss(&mut self) {
        self.requests += 1;
        self.cache_misses += 1;
    }

    /// Records one capacity eviction.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Records a successful write of `object_size` bytes.
    pub fn record_insertion(&mut self, object_size: u64) {
        self.bytes_written_to_cache += object_size;
    }

    /// Fraction of requests that were hits, or 0.0 before the first request.
    pub fn hit_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Fraction of requests that were misses, or 0.0 before the first request.
    pub fn miss_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_misses as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Converts the counters to a map, adding size and utilization for the
    /// given current size.
    pub fn to_btreemap(&self, cache_size_bytes: u64) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("requests".to_string(), self.requests as f64);
        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert("cache_misses".to_string(), self.cache_misses as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);

        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        metrics.insert(
            "bytes_served_from_cache".to_string(),
            self.bytes_served_from_cache as f64,
        );
        metrics.insert(
            "bytes_written_to_cache".to_string(),
            self.bytes_written_to_cache as f64,
        );

        metrics.insert("cache_size_bytes".to_string(), cache_size_bytes as f64);
        metrics.insert(
            "max_cache_size_bytes".to_string(),
            self.max_cache_size_bytes as f64,
        );
        let utilization = if self.max_cache_size_bytes > 0 {
            cache_size_bytes as f64 / self.max_cache_size_bytes as f64
        } else {
            0.0
        };
        metrics.insert("cache_utilization".to_string(), utilization);

        metrics
    }
}

/// Uniform metrics reporting.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Short identifier of the cache implementation.
    fn algorithm_name(&self) -> &'static str;
}
