//! Walk configuration

/// Workers are clamped to this range when resolved automatically.
const MIN_WORKERS: usize = 4;
const MAX_WORKERS: usize = 32;

/// Ordering applied to the entries of each directory before they are
/// dispatched to the callback.
///
/// Sorting is per-directory only: no order is guaranteed across
/// directories, and entries of different directories interleave
/// arbitrarily under parallelism.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    /// Dispatch entries in the order the directory read returns them.
    #[default]
    None,

    /// Ascending byte-wise order by name.
    Lexical,

    /// Directories first, then regular files, then everything else.
    /// Ties broken lexically.
    DirsFirst,

    /// Regular files first, then non-regular non-directories, then
    /// directories. Ties broken lexically.
    FilesFirst,
}

/// Configuration for a walk, read once at the start.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Follow symbolic links to directories, visiting each underlying
    /// inode at most once (cycle detection via the entry filter).
    pub follow: bool,

    /// Number of worker threads. `0` resolves to
    /// [`default_num_workers`] at walk entry.
    pub num_workers: usize,

    /// Per-directory entry ordering.
    pub sort: SortMode,

    /// Present every callback path with `/` separators regardless of
    /// the host convention.
    pub to_slash: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            follow: false,
            num_workers: 0,
            sort: SortMode::None,
            to_slash: false,
        }
    }
}

impl WalkConfig {
    pub(crate) fn resolved_workers(&self) -> usize {
        if self.num_workers == 0 {
            default_num_workers()
        } else {
            self.num_workers
        }
    }
}

/// The default worker count: the number of CPUs, clamped to 4..=32.
///
/// Directory walking is I/O bound, so a handful of workers already
/// keeps the kernel busy on small machines; past 32 the extra threads
/// only add contention on the work channels.
pub fn default_num_workers() -> usize {
    num_cpus::get().clamp(MIN_WORKERS, MAX_WORKERS)
}
