//! Cache Configuration Module
//!
//! [`DiskCacheConfig`] has public fields so it can be written out in full at
//! the call site; [`DiskCacheConfig::new`] fills in the defaults.
//!
//! # Sizing Guidelines
//!
//! `max_size` bounds the sum of payload sizes, i.e. the bytes written into
//! cache files. Filesystem block rounding and directory entries are not
//! counted, so actual disk usage is somewhat higher:
//!
//! ```text
//! disk usage ≈ max_size + entries × (block_size / 2)
//! ```
//!
//! **Example**: a 1GB budget for ~50KB objects holds about 20,000 files; with
//! 4KB blocks the overhead is roughly 40MB.
//!
//! # Examples
//!
//! ```
//! use disk_cache_rs::config::DiskCacheConfig;
//! use disk_cache_rs::KeyEncoding;
//!
//! // Defaults: percent-encoded names, atomic writes
//! let config = DiskCacheConfig::new("/var/cache/app", 512 * 1024 * 1024);
//! assert_eq!(config.key_encoding, KeyEncoding::Percent);
//!
//! // Everything spelled out
//! let config = DiskCacheConfig {
//!     base_dir: "/var/cache/app".into(),
//!     max_size: 64 * 1024 * 1024,
//!     key_encoding: KeyEncoding::Substitute,
//!     atomic_writes: false,
//! };
//! ```

use crate::encoding::KeyEncoding;
use core::fmt;
use std::path::PathBuf;

/// Configuration for a [`DiskCache`](crate::DiskCache).
///
/// # Fields
///
/// - `base_dir`: directory owned by the cache. Created on construction.
/// - `max_size`: byte budget for the sum of all cached payloads.
/// - `key_encoding`: how keys become file names.
/// - `atomic_writes`: write to a temporary file and rename it into place.
#[derive(Clone)]
pub struct DiskCacheConfig {
    /// Directory holding one file per cache entry.
    pub base_dir: PathBuf,
    /// Maximum total payload size in bytes.
    pub max_size: u64,
    /// Key to file name scheme.
    pub key_encoding: KeyEncoding,
    /// Publish writes by rename so readers never see a partial file.
    pub atomic_writes: bool,
}

impl DiskCacheConfig {
    /// Creates a configuration with percent-encoded names and atomic writes.
    pub fn new(base_dir: impl Into<PathBuf>, max_size: u64) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_size,
            key_encoding: KeyEncoding::default(),
            atomic_writes: true,
        }
    }
}

impl fmt::Debug for DiskCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskCacheConfig")
            .field("base_dir", &self.base_dir)
            .field("max_size", &self.max_size)
            .field("key_encoding", &self.key_encoding)
            .field("atomic_writes", &self.atomic_writes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DiskCacheConfig::new("cache", 5 * 1024);
        assert_eq!(config.base_dir, PathBuf::from("cache"));
        assert_eq!(config.max_size, 5 * 1024);
        assert_eq!(config.key_encoding, KeyEncoding::Percent);
        assert!(config.atomic_writes);
    }

    #[test]
    fn test_config_debug() {
        let config = DiskCacheConfig::new("cache", 1);
        let debug = format!("{:?}", config);
        assert!(debug.contains("DiskCacheConfig"));
        assert!(debug.contains("max_size"));
    }
}
