//! fswalk - Parallel Directory Tree Walker
//!
//! A faster alternative to sequential directory walking for filesystem
//! scanning tools. Instead of stat'ing every node on one thread, a
//! pool of workers overlaps directory I/O, and on Linux the directory
//! records are decoded straight out of the `getdents64` buffer, so the
//! type of every entry is known without a single per-entry `stat`.
//!
//! # Features
//!
//! - **Parallel traversal**: one coordinator plus N worker threads
//!   over bounded channels; backpressure instead of unbounded queues.
//!
//! - **Raw directory decoding**: native-endian `dirent64` parsing on
//!   Linux with pooled read buffers; a portable `std::fs::read_dir`
//!   reader everywhere else.
//!
//! - **Symlink following with cycle detection**: under
//!   [`WalkConfig::follow`], each underlying `(device, inode)` is
//!   visited at most once no matter how many links reach it.
//!
//! - **Lazy stat memoization**: [`DirEntry::info`] and
//!   [`DirEntry::stat`] each run at most once per entry, no matter how
//!   many threads ask.
//!
//! # Architecture
//!
//! ```text
//!                      ┌──────────────────┐
//!                      │   walk(config,   │
//!                      │  root, callback) │
//!                      └────────┬─────────┘
//!                               │ seeds root, becomes coordinator
//!                               ▼
//!               ┌───────────────────────────────┐
//!               │         Coordinator            │
//!               │  pending stack · in_flight     │
//!               │  select{dispatch,enqueue,done} │
//!               └───┬───────────────────────▲───┘
//!          work     │                       │  enqueue / results
//!                   ▼                       │
//!     ┌─────────┐  ┌─────────┐         ┌─────────┐
//!     │Worker 1 │  │Worker 2 │   ...   │Worker N │
//!     │ readdir │  │ readdir │         │ readdir │
//!     │ callback│  │ callback│         │ callback│
//!     └─────────┘  └─────────┘         └─────────┘
//! ```
//!
//! Workers read directories and run the user callback; every
//! subdirectory they discover goes back to the coordinator, which owns
//! all pending work. The callback for a directory always runs before
//! the callbacks for its children.
//!
//! # Example
//!
//! ```no_run
//! use fswalk::{walk, WalkAction, WalkConfig};
//!
//! let config = WalkConfig::default();
//! walk(&config, ".", |path, entry, read_error| {
//!     if let Some(err) = read_error {
//!         eprintln!("warning: {err}");
//!         return Ok(WalkAction::Continue);
//!     }
//!     if entry.name() == ".git" {
//!         return Ok(WalkAction::SkipDir);
//!     }
//!     println!("{}", path.display());
//!     Ok(WalkAction::Continue)
//! })?;
//! # Ok::<(), fswalk::WalkError>(())
//! ```

pub mod adapters;
pub mod config;
#[cfg(target_os = "linux")]
mod dirent;
pub mod entry;
pub mod error;
mod filter;
mod paths;
mod reader;
mod sort;
pub mod walker;

pub use adapters::{ignore_duplicate_files, ignore_permission_errors};
pub use config::{default_num_workers, SortMode, WalkConfig};
pub use entry::{DirEntry, EntryType};
pub use error::{Result, WalkAction, WalkError};
pub use filter::EntryFilter;
pub use walker::walk;
