//! Error types and callback control flow for fswalk
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Directory errors carry the failing operation and path so the
//!   callback can decide what to do with them
//! - Control flow ("skip this directory", "traverse this link") is a
//!   dedicated enum, not a distinguished error value

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Control signal returned by the walk callback.
///
/// The callback returns `Ok(action)` to steer the walk or `Err(_)` to
/// terminate it. Actions that do not apply to the entry at hand
/// (e.g. [`TraverseLink`] for a regular file) are treated as
/// [`Continue`].
///
/// [`TraverseLink`]: WalkAction::TraverseLink
/// [`Continue`]: WalkAction::Continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Keep walking.
    Continue,

    /// For a directory entry: prune its subtree. For a symlink: no-op
    /// success. For any other entry: stop reading the remainder of the
    /// containing directory.
    SkipDir,

    /// Suppress callbacks for the remaining regular files of the
    /// current directory. Subdirectories are still traversed.
    SkipFiles,

    /// For a symlink entry when `follow` is off: descend into the link
    /// target as if it were a directory. No cycle detection is
    /// performed for links traversed this way.
    TraverseLink,
}

/// Top-level error type for a walk
#[derive(Error, Debug)]
pub enum WalkError {
    /// The walk root could not be stat'ed; returned synchronously from
    /// [`walk`](crate::walk) before any worker starts.
    #[error("failed to stat walk root '{}': {source}", path.display())]
    RootStat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A directory could not be opened or read. Delivered to the
    /// callback as `read_error`; the callback decides whether the walk
    /// continues.
    #[error("{op} '{}': {source}", path.display())]
    Io {
        /// The failing operation, `"open"` or `"readdir"`.
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An error returned by the user callback. Terminates the walk;
    /// the first error to reach the coordinator wins.
    #[error("{0}")]
    Callback(Box<dyn std::error::Error + Send + Sync>),

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread {id}: {source}")]
    Spawn {
        id: usize,
        #[source]
        source: io::Error,
    },

    /// An internal channel disconnected while the walk was running.
    #[error("walk channel closed unexpectedly")]
    ChannelClosed,
}

impl WalkError {
    /// Wrap an arbitrary error value as a callback error.
    pub fn callback<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        WalkError::Callback(err.into())
    }

    pub(crate) fn open(path: &std::path::Path, source: io::Error) -> Self {
        WalkError::Io {
            op: "open",
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn readdir(path: &std::path::Path, source: io::Error) -> Self {
        WalkError::Io {
            op: "readdir",
            path: path.to_path_buf(),
            source,
        }
    }

    /// The underlying I/O error, if this is a stat or directory error.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            WalkError::RootStat { source, .. }
            | WalkError::Io { source, .. }
            | WalkError::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }

    /// True for permission-class directory errors. Used by
    /// [`ignore_permission_errors`](crate::ignore_permission_errors).
    pub fn is_permission_denied(&self) -> bool {
        self.io_error()
            .is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied)
    }

    /// Recover the original value from a callback error for identity
    /// checks.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            WalkError::Callback(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Result type alias for walk operations
pub type Result<T> = std::result::Result<T, WalkError>;
