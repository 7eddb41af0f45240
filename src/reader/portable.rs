//! Portable directory reads
//!
//! Backed by `std::fs::read_dir` for hosts without raw record access.
//! The listing is collected up front; if the iterator fails midway the
//! entries already obtained are still dispatched and the error is
//! reported afterwards, so a partially readable directory is not
//! silently dropped.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::entry::{DirEntry, EntryType};
use crate::error::WalkError;
use crate::reader::{EntrySink, ReadError, SinkFlow};

#[cfg_attr(target_os = "linux", allow(dead_code))]
pub(super) fn read_dir_portable(
    dir: &Path,
    depth: usize,
    skip_files: bool,
    sink: &mut EntrySink<'_>,
) -> Result<(), ReadError> {
    let iter = fs::read_dir(dir).map_err(|e| ReadError::Dir(WalkError::open(dir, e)))?;

    let mut listing = Vec::new();
    let mut read_err = None;
    for dent in iter {
        match dent {
            Ok(dent) => listing.push(dent),
            Err(e) => {
                read_err = Some(e);
                break;
            }
        }
    }
    if let Some(e) = read_err.take_if(|_| listing.is_empty()) {
        return Err(ReadError::Dir(WalkError::readdir(dir, e)));
    }

    let parent = Arc::new(dir.to_path_buf());
    let mut skip_files = skip_files;
    for dent in listing {
        let typ = match dent.file_type() {
            Ok(ft) => EntryType::from_std(ft),
            Err(_) => EntryType::Unknown,
        };
        if skip_files && typ.is_file() {
            continue;
        }
        let entry = DirEntry::new(Arc::clone(&parent), dent.file_name(), typ, depth);
        match sink(entry).map_err(ReadError::Sink)? {
            SinkFlow::Continue => {}
            SinkFlow::SkipFiles => skip_files = true,
            SinkFlow::Stop => return Ok(()),
        }
    }

    match read_err {
        Some(e) => Err(ReadError::Dir(WalkError::readdir(dir, e))),
        None => Ok(()),
    }
}
