//! Per-directory entry ordering
//!
//! The reader buffers one directory's entries, hands them here, then
//! dispatches in the resulting order. Ordering decisions use only the
//! type discriminator from the directory record, never a stat.

use std::cmp::Ordering;

use crate::config::SortMode;
use crate::entry::DirEntry;

/// Reorder `entries` in place according to `mode`. Stable, so records
/// the comparator considers equal keep their read order.
pub(crate) fn sort_entries(mode: SortMode, entries: &mut [DirEntry]) {
    if entries.len() <= 1 {
        return;
    }
    match mode {
        SortMode::None => {}
        SortMode::Lexical => entries.sort_by(|a, b| a.name().cmp(b.name())),
        SortMode::DirsFirst => entries.sort_by(dirs_first),
        SortMode::FilesFirst => entries.sort_by(files_first),
    }
}

fn dirs_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    let (d1, d2) = (a.is_dir(), b.is_dir());
    match (d1, d2) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => {
            // Neither is a directory: regular files before specials.
            let (r1, r2) = (a.entry_type().is_file(), b.entry_type().is_file());
            match (r1, r2) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => a.name().cmp(b.name()),
            }
        }
        (true, true) => a.name().cmp(b.name()),
    }
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    let (r1, r2) = (a.entry_type().is_file(), b.entry_type().is_file());
    match (r1, r2) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => {
            // Neither is a regular file: directories last.
            let (d1, d2) = (a.is_dir(), b.is_dir());
            match (d1, d2) {
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                _ => a.name().cmp(b.name()),
            }
        }
        (true, true) => a.name().cmp(b.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;
    use std::ffi::OsString;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn entries(items: &[(&str, EntryType)]) -> Vec<DirEntry> {
        let parent = Arc::new(PathBuf::from("/t"));
        items.iter()
            .map(|(name, typ)| {
                DirEntry::new(Arc::clone(&parent), OsString::from(*name), *typ, 1)
            })
            .collect()
    }

    fn names(entries: &[DirEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.name().to_string_lossy().into_owned())
            .collect()
    }

    fn sample() -> Vec<DirEntry> {
        entries(&[
            ("b.txt", EntryType::File),
            ("z", EntryType::Directory),
            ("sock", EntryType::Socket),
            ("a.txt", EntryType::File),
            ("link", EntryType::Symlink),
            ("a", EntryType::Directory),
        ])
    }

    #[test]
    fn test_sort_none_keeps_read_order() {
        let mut ents = sample();
        let before = names(&ents);
        sort_entries(SortMode::None, &mut ents);
        assert_eq!(names(&ents), before);
    }

    #[test]
    fn test_sort_lexical() {
        let mut ents = sample();
        sort_entries(SortMode::Lexical, &mut ents);
        assert_eq!(names(&ents), ["a", "a.txt", "b.txt", "link", "sock", "z"]);
    }

    #[test]
    fn test_sort_dirs_first() {
        let mut ents = sample();
        sort_entries(SortMode::DirsFirst, &mut ents);
        assert_eq!(names(&ents), ["a", "z", "a.txt", "b.txt", "link", "sock"]);
    }

    #[test]
    fn test_sort_files_first() {
        let mut ents = sample();
        sort_entries(SortMode::FilesFirst, &mut ents);
        assert_eq!(names(&ents), ["a.txt", "b.txt", "link", "sock", "a", "z"]);
    }

    #[test]
    fn test_sort_byte_wise_not_locale() {
        let mut ents = entries(&[
            ("B", EntryType::File),
            ("a", EntryType::File),
            ("A", EntryType::File),
        ]);
        sort_entries(SortMode::Lexical, &mut ents);
        // ASCII uppercase sorts before lowercase byte-wise.
        assert_eq!(names(&ents), ["A", "B", "a"]);
    }
}
