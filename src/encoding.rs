//! Key to file name encoding.
//!
//! Every cache key becomes exactly one path segment under the cache
//! directory. Two schemes are available:
//!
//! | Scheme | Injective | Example (`"/img/a@b.png"`) |
//! |--------|-----------|----------------------------|
//! | [`KeyEncoding::Percent`] | yes | `%2Fimg%2Fa%40b.png` |
//! | [`KeyEncoding::Substitute`] | no | `@img@a@b.png` |
//!
//! `Substitute` replaces path separators with `@`. Keys that already contain
//! `@` can therefore share a file with another key; it is kept for
//! directories written by older deployments.
//!
//! # Long keys
//!
//! A name longer than [`MAX_NAME_LEN`] is replaced by the hex SHA-256 of the
//! raw key followed by `.%sha`. Such names cannot be decoded; they are found
//! again by hashing the key.
//!
//! # Reserved names
//!
//! Names ending in `.%tmp` (in-flight writes) or `.%sha` (digests) are never
//! produced for a key directly. Percent-encoding cannot emit them because `%`
//! is always followed by two hex digits; `Substitute` rejects such keys.

use std::borrow::Cow;

use sha2::{Digest as Sha2Digest, Sha256};

use crate::store::TEMP_SUFFIX;

const SUBSTITUTE: &str = "@";

/// Suffix of digest names used for keys whose encoding is too long.
pub const DIGEST_SUFFIX: &str = "%sha";

/// Longest name produced by [`KeyEncoding::encode`]. Leaves room for the
/// temporary suffix within the common 255-byte file name limit.
pub const MAX_NAME_LEN: usize = 255 - 1 - TEMP_SUFFIX.len();

const DIGEST_HEX_LEN: usize = 64;

/// How raw keys are turned into file names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyEncoding {
    /// Reversible percent-escaping of every byte outside `[A-Za-z0-9_.~-]`.
    #[default]
    Percent,
    /// Path separators replaced by `@`. Not injective.
    Substitute,
}

impl KeyEncoding {
    /// Maps `key` to a file name. Returns `None` for keys that cannot name a
    /// file: the empty key, and under `Substitute` the names `.`/`..` and
    /// keys ending in a reserved suffix.
    pub fn encode(self, key: &str) -> Option<String> {
        if key.is_empty() {
            return None;
        }
        let name = match self {
            KeyEncoding::Percent => match key {
                "." => "%2E".to_string(),
                ".." => "%2E%2E".to_string(),
                _ => urlencoding::encode(key).into_owned(),
            },
            KeyEncoding::Substitute => {
                if key == "." || key == ".." || has_reserved_suffix(key) {
                    return None;
                }
                key.replace(['/', '\\'], SUBSTITUTE)
            }
        };
        if name.len() > MAX_NAME_LEN {
            return Some(digest_name(key));
        }
        Some(name)
    }

    /// Returns a key that [`encode`](Self::encode)s to exactly `name`, if
    /// there is one that can be recovered from the name alone.
    ///
    /// Digest names and names the scheme would never produce give `None`.
    pub fn decode(self, name: &str) -> Option<String> {
        if is_digest_name(name) {
            return None;
        }
        let key = match self {
            KeyEncoding::Percent => urlencoding::decode(name).ok().map(Cow::into_owned)?,
            KeyEncoding::Substitute => name.to_string(),
        };
        (self.encode(&key).as_deref() == Some(name)).then_some(key)
    }

    /// Reports whether some key encodes to `name`, so a file under that name
    /// can be reached through the cache.
    pub fn is_reachable(self, name: &str) -> bool {
        is_digest_name(name) || self.decode(name).is_some()
    }
}

fn digest_name(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{}.{DIGEST_SUFFIX}", hex::encode(hasher.finalize()))
}

/// Returns true for names of the form `<64 lowercase hex>.%sha`.
pub fn is_digest_name(name: &str) -> bool {
    match name.strip_suffix(DIGEST_SUFFIX).and_then(|n| n.strip_suffix('.')) {
        Some(hash) => {
            hash.len() == DIGEST_HEX_LEN
                && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        }
        None => false,
    }
}

fn has_reserved_suffix(name: &str) -> bool {
    [TEMP_SUFFIX, DIGEST_SUFFIX].iter().any(|suffix| {
        name.strip_suffix(suffix)
            .is_some_and(|rest| rest.ends_with('.'))
    })
}
