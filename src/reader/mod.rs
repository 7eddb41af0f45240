//! Directory enumeration
//!
//! Two implementations behind one façade: a raw reader that decodes
//! batched `getdents64` records (Linux), and a portable reader backed
//! by `std::fs::read_dir`. The façade adds per-directory sorting:
//! with a sort mode the whole directory is buffered, ordered, then
//! dispatched; without one, entries flow to the sink as they are
//! decoded.

use std::path::Path;

use crate::config::SortMode;
use crate::entry::DirEntry;
use crate::error::{Result, WalkError};
use crate::sort::sort_entries;

mod portable;
#[cfg(target_os = "linux")]
mod raw;

#[cfg(target_os = "linux")]
use raw::read_dir_raw as read_dir_impl;

#[cfg(not(target_os = "linux"))]
use portable::read_dir_portable as read_dir_impl;

/// What the sink wants the reader to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SinkFlow {
    Continue,
    /// Elide the remaining regular files of this directory.
    SkipFiles,
    /// Stop reading this directory; not an error.
    Stop,
}

/// Reader failure, split by where it must be reported.
#[derive(Debug)]
pub(crate) enum ReadError {
    /// The directory itself could not be opened or read; the engine
    /// delivers this to the callback as `read_error`.
    Dir(WalkError),
    /// The sink (ultimately the user callback) returned an error; it
    /// propagates as-is.
    Sink(WalkError),
}

/// Per-entry sink driven by the reader.
pub(crate) type EntrySink<'a> = dyn FnMut(DirEntry) -> Result<SinkFlow> + 'a;

pub(crate) struct ReadOptions {
    pub sort: SortMode,
    /// Start with the skip-files flag already set (the callback
    /// returned it at the directory's pre-read visit).
    pub skip_files: bool,
    /// Depth assigned to the entries read from this directory.
    pub depth: usize,
}

/// Enumerate the immediate children of `dir`, feeding each entry to
/// `sink`. "." and ".." are never surfaced.
pub(crate) fn read_dir(
    dir: &Path,
    opts: &ReadOptions,
    sink: &mut EntrySink<'_>,
) -> std::result::Result<(), ReadError> {
    if opts.sort == SortMode::None {
        return read_dir_impl(dir, opts.depth, opts.skip_files, sink);
    }

    // Sorting requires the whole directory up front. A read error
    // after partial progress still dispatches what was decoded; the
    // error is reported once dispatch is done.
    let mut entries = Vec::new();
    let read_err = match read_dir_impl(dir, opts.depth, opts.skip_files, &mut |entry| {
        entries.push(entry);
        Ok(SinkFlow::Continue)
    }) {
        Ok(()) => None,
        Err(err @ ReadError::Dir(_)) => Some(err),
        // The collector never fails.
        Err(err @ ReadError::Sink(_)) => return Err(err),
    };

    sort_entries(opts.sort, &mut entries);

    let mut skip_files = opts.skip_files;
    for entry in entries {
        if skip_files && entry.entry_type().is_file() {
            continue;
        }
        match sink(entry).map_err(ReadError::Sink)? {
            SinkFlow::Continue => {}
            SinkFlow::SkipFiles => skip_files = true,
            SinkFlow::Stop => return Ok(()),
        }
    }

    match read_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
