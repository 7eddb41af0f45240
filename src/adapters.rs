//! Callback adapters
//!
//! Thin decorators over a walk callback for the two chores almost
//! every caller ends up writing: dropping permission errors, and
//! skipping entries that resolve to an already-visited inode.

use std::path::Path;

use crate::entry::DirEntry;
use crate::error::{Result, WalkAction, WalkError};
use crate::filter::EntryFilter;

/// Whether `entry` is a directory for traversal purposes: either the
/// record says so, or it is a symlink whose target stats as one.
fn is_dir(entry: &DirEntry) -> bool {
    if entry.is_dir() {
        return true;
    }
    if entry.entry_type().is_symlink() {
        if let Ok(md) = entry.stat() {
            return md.is_dir();
        }
    }
    false
}

/// Wrap `walk_fn` so that permission-class read errors are absorbed
/// without invoking it; everything else passes through.
///
/// ```no_run
/// use fswalk::{walk, ignore_permission_errors, WalkAction, WalkConfig};
///
/// let conf = WalkConfig::default();
/// walk(&conf, "/var", ignore_permission_errors(|path, _entry, _err| {
///     println!("{}", path.display());
///     Ok(WalkAction::Continue)
/// }))?;
/// # Ok::<(), fswalk::WalkError>(())
/// ```
pub fn ignore_permission_errors<F>(
    walk_fn: F,
) -> impl Fn(&Path, &DirEntry, Option<WalkError>) -> Result<WalkAction> + Send + Sync
where
    F: Fn(&Path, &DirEntry, Option<WalkError>) -> Result<WalkAction> + Send + Sync,
{
    move |path, entry, read_error| {
        if let Some(err) = &read_error {
            if err.is_permission_denied() {
                return Ok(WalkAction::Continue);
            }
        }
        walk_fn(path, entry, read_error)
    }
}

/// Wrap `walk_fn` so that symlinks are followed and entries resolving
/// to an already-visited inode are skipped: directories are pruned
/// with [`WalkAction::SkipDir`], other duplicates are silently passed
/// over. On first sight of a symlink to a directory the wrapper
/// returns [`WalkAction::TraverseLink`] so the target is descended
/// into.
///
/// Intended for walks with `follow` off; with `follow` on, the engine
/// already deduplicates directories and this wrapper additionally
/// deduplicates files.
pub fn ignore_duplicate_files<F>(
    walk_fn: F,
) -> impl Fn(&Path, &DirEntry, Option<WalkError>) -> Result<WalkAction> + Send + Sync
where
    F: Fn(&Path, &DirEntry, Option<WalkError>) -> Result<WalkAction> + Send + Sync,
{
    let filter = EntryFilter::new();
    move |path, entry, read_error| {
        if filter.seen_entry(path, entry) {
            if is_dir(entry) {
                return Ok(WalkAction::SkipDir);
            }
            return Ok(WalkAction::Continue);
        }
        let action = walk_fn(path, entry, read_error)?;
        if action == WalkAction::Continue && entry.entry_type().is_symlink() && is_dir(entry) {
            return Ok(WalkAction::TraverseLink);
        }
        Ok(action)
    }
}
