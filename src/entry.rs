//! Index entry describing one resident cache file.
//!
//! A `CacheEntry` never holds the payload itself; the bytes live on disk under
//! the entry's encoded name. The entry carries only what the recency index
//! needs for bookkeeping:
//!
//! - `name`: the encoded, filesystem-safe file name (the index key)
//! - `key`: the raw key, when known (entries rebuilt from a directory scan
//!   only know their encoded name)
//! - `size`: the payload size in bytes, counted against the byte budget
//! - `generation`: a per-index insertion stamp used to tell a re-inserted
//!   entry apart from the one a reader observed earlier

use std::fmt;

/// Bookkeeping record for one cached file.
#[derive(Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub(crate) name: String,
    pub(crate) key: Option<String>,
    pub(crate) size: u64,
    pub(crate) generation: u64,
}

impl CacheEntry {
    pub(crate) fn new(name: String, key: Option<String>, size: u64, generation: u64) -> Self {
        Self {
            name,
            key,
            size,
            generation,
        }
    }

    /// Encoded file name of the entry.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw key the entry was stored under, if it is known.
    #[inline]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Payload size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Insertion stamp assigned by the index.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("size", &self.size)
            .field("generation", &self.generation)
            .finish()
    }
}
