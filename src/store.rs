//! Blob storage under the cache directory.
//!
//! [`FileStore`] reads, writes and deletes flat files named by encoded keys.
//! It keeps no state besides its directory and has no notion of budgets or
//! recency.
//!
//! # Atomic writes
//!
//! With atomic writes enabled, a payload is first written to a temporary
//! sibling (`<name>.<TEMP_SUFFIX>`) and then renamed over `<name>`, so readers
//! observe either the previous or the new content. Without them a reader may
//! see a truncated file while a write is in flight; the cache treats that the
//! same as a failed read.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

/// Suffix of in-flight temporary files. Percent-encoded names never end in
/// it because `%` is always followed by two hex digits.
pub const TEMP_SUFFIX: &str = "%tmp";

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Flat file storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
    atomic_writes: bool,
}

impl FileStore {
    /// Opens the store, creating `base_dir` (and its parents) if needed.
    pub fn open(base_dir: impl Into<PathBuf>, atomic_writes: bool) -> io::Result<Self> {
        let base_dir = base_dir.into();
        create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            atomic_writes,
        })
    }

    #[inline]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Full path of the file backing `name`.
    #[inline]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    pub fn write(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let path = self.path_of(name);
        if !self.atomic_writes {
            return write_file(&path, data);
        }

        let tmp = self.path_of(&format!("{name}.{TEMP_SUFFIX}"));
        if let Err(err) = write_file(&tmp, data).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        trace!(name = %name, size = data.len(), "wrote cache file");
        Ok(())
    }

    pub fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(name))
    }

    /// Deletes the file for `name`. A missing file is not an error.
    pub fn delete(&self, name: &str) -> io::Result<()> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Lists regular files directly under the directory as `(name, size)`,
    /// in directory traversal order. Names that are not valid UTF-8 are
    /// skipped.
    pub fn scan(&self) -> io::Result<Vec<(String, u64)>> {
        let mut found = Vec::new();
        for dirent in fs::read_dir(&self.base_dir)? {
            let dirent = dirent?;
            let meta = match dirent.metadata() {
                Ok(meta) => meta,
                // raced with a concurrent delete
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err),
            };
            if !meta.is_file() {
                continue;
            }
            let Ok(name) = dirent.file_name().into_string() else {
                continue;
            };
            found.push((name, meta.len()));
        }
        Ok(found)
    }

    /// Returns true for names of leftover temporary files.
    #[inline]
    pub fn is_temp_name(name: &str) -> bool {
        name.ends_with(&format!(".{TEMP_SUFFIX}"))
    }
}

#[cfg(unix)]
fn create_dir_all(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(path)
}

#[cfg(not(unix))]
fn create_dir_all(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    let mut file = options.open(path)?;
    file.write_all(data)
}
