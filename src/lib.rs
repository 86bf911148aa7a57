//! A size-bounded, disk-backed LRU cache for byte payloads.
//!
//! Each cache entry is one regular file under a single directory, named by an
//! encoding of its key. The sum of payload sizes is kept within a configured
//! byte budget by evicting the least recently used entries. All bookkeeping
//! (sizes, recency) lives in memory and is rebuilt from the directory when a
//! cache is opened.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          DiskCache                               │
//! │                                                                  │
//! │   key ──▶ KeyEncoding ──▶ name                                   │
//! │                                                                  │
//! │   ┌──────────────── RwLock ───────────────┐   ┌───────────────┐  │
//! │   │ RecencyIndex          CoreCacheMetrics │   │   FileStore   │  │
//! │   │ name ▶ node           hits / misses    │   │ <dir>/<name>  │  │
//! │   │ MRU ⇄ ... ⇄ LRU       evictions        │   │               │  │
//! │   └────────────────────────────────────────┘   └───────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use disk_cache_rs::DiskCache;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let cache = DiskCache::new(dir.path(), 5 * 1024).unwrap();
//!
//! cache.set("name", b"stormi-li");
//! assert_eq!(cache.get("name").as_deref(), Some(&b"stormi-li"[..]));
//!
//! cache.del("name");
//! assert!(cache.get("name").is_none());
//! assert_eq!(cache.hit_count(), 1);
//! assert_eq!(cache.miss_count(), 1);
//! ```
//!
//! # Guarantees
//!
//! - After every `set`, `del` and `get` returns, `current_size() <= max_size()`.
//! - A payload larger than the budget is never written.
//! - A file removed behind the cache's back is dropped from the index on the
//!   next `get` and counted as a miss.
//! - One cache instance owns its directory. Two instances over the same
//!   directory will disagree about its contents.
//!
//! # Modules
//!
//! - [`cache`]: the [`DiskCache`] engine
//! - [`config`]: [`DiskCacheConfig`](config::DiskCacheConfig)
//! - [`encoding`]: key to file name schemes
//! - [`index`]: the in-memory recency index
//! - [`store`]: flat file storage
//! - [`metrics`]: hit/miss/eviction counters and reporting
//! - [`error`]: error types

/// Doubly linked list backing the recency index.
///
/// Internal infrastructure built on raw pointers; use [`index::RecencyIndex`]
/// instead.
pub(crate) mod list;

/// Index entry type.
pub mod entry;

/// Recency index: O(1) promotion, removal and least-recent eviction with
/// aggregate size tracking.
pub mod index;

/// Key to file name encoding.
pub mod encoding;

/// Flat file storage under the cache directory.
pub mod store;

/// Cache configuration.
pub mod config;

/// Error types for construction and for the checked write path.
pub mod error;

/// Cache counters and the `CacheMetrics` reporting trait.
pub mod metrics;

/// The disk cache engine.
pub mod cache;

pub use cache::DiskCache;
pub use config::DiskCacheConfig;
pub use encoding::KeyEncoding;
pub use entry::CacheEntry;
pub use error::{Error, Result, SetError};
pub use index::RecencyIndex;
pub use metrics::{CacheMetrics, CoreCacheMetrics};
