//! Duplicate-entry detection for follow-mode
//!
//! Under follow-mode a visited directory is identified by inode
//! identity rather than path identity, which handles symlink-to-parent
//! loops, multi-linked directories, and links reaching one directory
//! via distinct paths. A plain `Mutex` guards the set: almost every
//! call mutates (first sight inserts), so a read-write lock buys
//! nothing.

use std::collections::HashSet;
use std::path::Path;

use parking_lot::Mutex;
use tracing::trace;

use crate::entry::DirEntry;

#[cfg(unix)]
type FileKey = (u64, u64);

/// Non-Unix hosts have no stable `(dev, ino)` surface in std; fall
/// back to resolved-path identity.
#[cfg(not(unix))]
type FileKey = std::path::PathBuf;

/// A concurrent set of already-visited filesystem objects.
///
/// Exposed publicly because [`ignore_duplicate_files`] builds on it
/// and some callers want their own dedupe across multiple walks.
///
/// [`ignore_duplicate_files`]: crate::ignore_duplicate_files
#[derive(Debug, Default)]
pub struct EntryFilter {
    keys: Mutex<HashSet<FileKey>>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(HashSet::with_capacity(128)),
        }
    }

    /// Atomic check-and-insert. Returns whether the key was already
    /// present; for any set of concurrent calls, exactly one call per
    /// distinct key observes `false`.
    #[cfg(unix)]
    pub fn seen(&self, dev: u64, ino: u64) -> bool {
        !self.keys.lock().insert((dev, ino))
    }

    /// Whether the object `entry` resolves to has been visited before.
    /// Stat failures count as already seen: an unresolvable entry must
    /// not be descended into.
    pub fn seen_entry(&self, path: &Path, entry: &DirEntry) -> bool {
        match entry.stat() {
            #[cfg(unix)]
            Ok(md) => {
                use std::os::unix::fs::MetadataExt;
                self.seen(md.dev(), md.ino())
            }
            #[cfg(not(unix))]
            Ok(_) => match std::fs::canonicalize(path) {
                Ok(resolved) => !self.keys.lock().insert(resolved),
                Err(_) => true,
            },
            Err(err) => {
                trace!(path = %path.display(), error = %err, "treating unresolvable entry as seen");
                true
            }
        }
    }
}
