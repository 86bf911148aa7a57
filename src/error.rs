//! Error types.
//!
//! Only construction can fail outright. Write-path rejections are reported
//! through [`SetError`] by [`DiskCache::try_set`](crate::DiskCache::try_set);
//! the plain [`DiskCache::set`](crate::DiskCache::set) logs and swallows them.

use std::io;
use std::path::PathBuf;

/// Result type for cache construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to bring a cache up over its directory.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The base directory does not exist and could not be created.
    #[error("failed to create cache directory {}", path.display())]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The base directory could not be listed.
    #[error("failed to scan cache directory {}", path.display())]
    ScanDir {
        /// Directory that was being scanned.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Reason a payload was not cached.
#[derive(Debug, thiserror::Error)]
pub enum SetError {
    /// The key has no file name representation.
    #[error("key cannot be mapped to a file name")]
    InvalidKey,

    /// Empty payloads are never cached.
    #[error("refusing to cache an empty payload")]
    EmptyValue,

    /// The payload alone exceeds the cache budget.
    #[error("payload of {size} bytes exceeds cache budget of {max_size} bytes")]
    TooLarge {
        /// Payload size in bytes.
        size: u64,
        /// Configured budget in bytes.
        max_size: u64,
    },

    /// Writing the payload to disk failed.
    #[error("failed to write cache file {name}")]
    Write {
        /// Encoded file name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_messages() {
        let err = SetError::TooLarge {
            size: 10,
            max_size: 4,
        };
        assert_eq!(
            err.to_string(),
            "payload of 10 bytes exceeds cache budget of 4 bytes"
        );

        let err = Error::CreateDir {
            path: PathBuf::from("/nope"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/nope"));
        assert!(err.source().is_some());
    }
}
