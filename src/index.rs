//! Recency Index
//!
//! Tracks resident cache files in order of recency of use together with their
//! aggregate size. This is the in-memory half of the cache: it knows nothing
//! about the filesystem and never performs I/O.
//!
//! # Structure
//!
//! ```text
//!   map: name ──▶ *mut Node ─┐
//!                            ▼
//!   head ⇄ [most recent] ⇄ ... ⇄ [least recent] ⇄ tail
//! ```
//!
//! The map gives O(1) lookup by encoded name, the intrusive list gives O(1)
//! promotion, removal of a given node and removal of the least recent node.
//! Entries inserted in the same "instant" are ordered by insertion: the
//! earlier insertion sits closer to the tail and is evicted first.
//!
//! # Thread Safety
//!
//! `RecencyIndex` is not synchronized. [`DiskCache`](crate::DiskCache) keeps it
//! behind a single `RwLock` together with its counters.

use crate::entry::CacheEntry;
use crate::list::{List, Node};

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Recency-ordered set of [`CacheEntry`] values keyed by encoded name.
///
/// # Safety
///
/// The raw pointers stored in `map` always point at nodes owned by `list`:
/// a pointer is inserted right after `List::push_front` and is removed from
/// the map before its node leaves the list.
pub struct RecencyIndex {
    list: List<CacheEntry>,
    map: HashMap<String, *mut Node<CacheEntry>>,
    total_size: u64,
    next_generation: u64,
}

// SAFETY: the index owns every node its pointers reference; nothing is shared
// outside of `&mut self` access.
unsafe impl Send for RecencyIndex {}

// SAFETY: shared references only read through the pointers.
unsafe impl Sync for RecencyIndex {}

impl RecencyIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            list: List::new(),
            map: HashMap::new(),
            total_size: 0,
            next_generation: 0,
        }
    }

    /// Inserts `name` as the most recent entry.
    ///
    /// Returns `false` and leaves the index untouched when `name` is already
    /// present; the caller decides whether to replace it.
    pub fn add(&mut self, name: &str, key: Option<&str>, size: u64) -> bool {
        if self.map.contains_key(name) {
            return false;
        }
        let generation = self.next_generation;
        self.next_generation += 1;

        let entry = CacheEntry::new(name.to_owned(), key.map(str::to_owned), size, generation);
        let node = self.list.push_front(entry);
        self.map.insert(name.to_owned(), node);
        self.total_size += size;
        true
    }

    /// Promotes `name` to most recent. Returns whether it was present.
    pub fn touch(&mut self, name: &str) -> bool {
        match self.map.get(name).copied() {
            Some(node) => {
                // SAFETY: node comes from our map
                unsafe { self.list.move_to_front(node) };
                true
            }
            None => false,
        }
    }

    /// Looks at an entry without changing its recency.
    pub fn peek(&self, name: &str) -> Option<&CacheEntry> {
        let node = self.map.get(name).copied()?;
        // SAFETY: node comes from our map
        Some(unsafe { self.list.value(node) })
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Removes `name` and returns the size it accounted for.
    pub fn remove(&mut self, name: &str) -> Option<u64> {
        self.take(name).map(|entry| entry.size)
    }

    /// Removes `name` only if it still carries `generation`.
    ///
    /// Used to drop a stale entry without discarding a newer entry that was
    /// inserted under the same name in the meantime.
    pub fn remove_if_generation(&mut self, name: &str, generation: u64) -> Option<u64> {
        match self.peek(name) {
            Some(entry) if entry.generation == generation => self.remove(name),
            _ => None,
        }
    }

    /// Removes and returns the least recently used entry.
    pub fn remove_oldest(&mut self) -> Option<CacheEntry> {
        let node = self.list.pop_back()?;
        // SAFETY: pop_back only returns value nodes
        let entry = unsafe { node.into_value() };
        self.map.remove(entry.name.as_str());
        self.total_size -= entry.size;
        Some(entry)
    }

    /// Aggregate size of every indexed entry.
    #[inline]
    pub fn size(&self) -> u64 {
        self.total_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates entries from least to most recent.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &CacheEntry> {
        self.list.iter_oldest_first()
    }

    /// Removes every entry and returns them, least recent first.
    pub fn drain(&mut self) -> Vec<CacheEntry> {
        let mut drained = Vec::with_capacity(self.len());
        while let Some(entry) = self.remove_oldest() {
            drained.push(entry);
        }
        drained
    }

    fn take(&mut self, name: &str) -> Option<CacheEntry> {
        let node = self.map.remove(name)?;
        // SAFETY: node came from our map and is still linked into the list
        let boxed = unsafe { self.list.remove(node) }?;
        // SAFETY: list.remove only returns value nodes
        let entry = unsafe { boxed.into_value() };
        self.total_size -= entry.size;
        Some(entry)
    }
}

impl Default for RecencyIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for RecencyIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecencyIndex")
            .field("len", &self.map.len())
            .field("total_size", &self.total_size)
            .finish()
    }
}
