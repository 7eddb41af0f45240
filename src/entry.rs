//! Directory entry handle
//!
//! A [`DirEntry`] is created by the directory reader for every record
//! it decodes and shared immutably between the walk engine and the
//! user callback. The two stat results (link-level and target-level)
//! are computed at most once per entry; concurrent first accesses race
//! to initialize a `OnceLock` and every caller observes the same
//! stored outcome.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Type of filesystem entry as reported by the directory read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
    /// Block device
    BlockDevice,
    /// Character device
    CharDevice,
    /// Named pipe (FIFO)
    Fifo,
    /// Unix socket
    Socket,
    /// A node kind the host reports but this crate has no name for
    Other,
    /// The filesystem did not report a type in its directory records
    /// (some network filesystems); an explicit stat is required
    Unknown,
}

impl EntryType {
    /// Map a raw dirent `d_type` byte to an entry type. Unrecognized
    /// values map to [`EntryType::Unknown`].
    #[cfg(target_os = "linux")]
    pub(crate) fn from_dirent_byte(typ: u8) -> Self {
        match typ {
            libc::DT_REG => EntryType::File,
            libc::DT_DIR => EntryType::Directory,
            libc::DT_LNK => EntryType::Symlink,
            libc::DT_BLK => EntryType::BlockDevice,
            libc::DT_CHR => EntryType::CharDevice,
            libc::DT_FIFO => EntryType::Fifo,
            libc::DT_SOCK => EntryType::Socket,
            _ => EntryType::Unknown,
        }
    }

    /// Convert from the host's stat-derived file type.
    pub fn from_std(ft: fs::FileType) -> Self {
        if ft.is_file() {
            return EntryType::File;
        }
        if ft.is_dir() {
            return EntryType::Directory;
        }
        if ft.is_symlink() {
            return EntryType::Symlink;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_block_device() {
                return EntryType::BlockDevice;
            }
            if ft.is_char_device() {
                return EntryType::CharDevice;
            }
            if ft.is_fifo() {
                return EntryType::Fifo;
            }
            if ft.is_socket() {
                return EntryType::Socket;
            }
        }
        EntryType::Other
    }

    /// Check if this is a regular file
    pub fn is_file(self) -> bool {
        self == EntryType::File
    }

    /// Check if this is a directory
    pub fn is_dir(self) -> bool {
        self == EntryType::Directory
    }

    /// Check if this is a symbolic link
    pub fn is_symlink(self) -> bool {
        self == EntryType::Symlink
    }
}

type StatResult = std::result::Result<Metadata, io::Error>;

fn clone_stat(res: &StatResult) -> io::Result<Metadata> {
    match res {
        Ok(md) => Ok(md.clone()),
        // io::Error is not Clone; preserve kind and message.
        Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
    }
}

struct EntryInner {
    parent: Arc<PathBuf>,
    name: OsString,
    entry_type: EntryType,
    depth: usize,
    info: OnceLock<StatResult>,
    stat: OnceLock<StatResult>,
}

/// One node of the directory tree as observed by the directory read.
///
/// Clones share the same memoization cells, so a stat performed
/// through one handle is visible through every clone.
#[derive(Clone)]
pub struct DirEntry {
    inner: Arc<EntryInner>,
}

impl DirEntry {
    pub(crate) fn new(
        parent: Arc<PathBuf>,
        name: OsString,
        entry_type: EntryType,
        depth: usize,
    ) -> Self {
        Self {
            inner: Arc::new(EntryInner {
                parent,
                name,
                entry_type,
                depth,
                info: OnceLock::new(),
                stat: OnceLock::new(),
            }),
        }
    }

    /// Build an entry from an already-performed link-level stat. Used
    /// for the walk root.
    pub(crate) fn from_metadata(
        parent: Arc<PathBuf>,
        name: OsString,
        md: Metadata,
        depth: usize,
    ) -> Self {
        let entry = Self::new(parent, name, EntryType::from_std(md.file_type()), depth);
        let _ = entry.inner.info.set(Ok(md));
        entry
    }

    /// Substitute for a symlink whose target turned out to be an
    /// unvisited directory under follow-mode: the callback must see a
    /// directory-typed entry for the subtree it is about to receive.
    pub(crate) fn resolve_to_dir(&self, target: Metadata) -> Self {
        let resolved = Self::new(
            Arc::clone(&self.inner.parent),
            self.inner.name.clone(),
            EntryType::Directory,
            self.inner.depth,
        );
        let _ = resolved.inner.info.set(Ok(target));
        resolved
    }

    /// Basename of the entry. Never contains a separator, never "."
    /// or "..".
    pub fn name(&self) -> &OsStr {
        &self.inner.name
    }

    /// Directory under which the entry lives.
    pub fn parent(&self) -> &Path {
        &self.inner.parent
    }

    /// The type discriminator from the directory record.
    pub fn entry_type(&self) -> EntryType {
        self.inner.entry_type
    }

    /// Distance from the walk root; 0 for the root itself.
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    /// True if the directory record reported a directory. Does not
    /// resolve symlinks.
    pub fn is_dir(&self) -> bool {
        self.inner.entry_type.is_dir()
    }

    /// `parent/name`
    pub fn path(&self) -> PathBuf {
        self.inner.parent.join(&self.inner.name)
    }

    /// Link-level stat: information about the entry itself, not about
    /// what a symlink resolves to. Computed at most once.
    pub fn info(&self) -> io::Result<Metadata> {
        clone_stat(
            self.inner
                .info
                .get_or_init(|| fs::symlink_metadata(self.path())),
        )
    }

    /// Target-level stat: for a symlink, information about what it
    /// resolves to; for anything else, identical to [`info`].
    /// Computed at most once.
    ///
    /// [`info`]: DirEntry::info
    pub fn stat(&self) -> io::Result<Metadata> {
        if self.inner.entry_type != EntryType::Symlink {
            return self.info();
        }
        clone_stat(self.inner.stat.get_or_init(|| fs::metadata(self.path())))
    }
}

impl fmt::Debug for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirEntry")
            .field("name", &self.inner.name)
            .field("parent", &self.inner.parent)
            .field("entry_type", &self.inner.entry_type)
            .field("depth", &self.inner.depth)
            .finish_non_exhaustive()
    }
}
