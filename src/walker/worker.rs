//! Worker thread logic for the parallel walk
//!
//! Each worker pulls one pending directory at a time from the
//! coordinator, runs the pre-read callback, drives the directory
//! reader with `on_entry` as the sink, and reports the per-directory
//! outcome on the result channel. Newly discovered directories go back
//! to the coordinator via the enqueue channel rather than being walked
//! inline, so the coordinator's stack stays the single source of
//! pending work.

use std::path::{Path, PathBuf};

use crossbeam_channel::{select, Receiver, Sender};
use tracing::{debug, trace};

use crate::config::WalkConfig;
use crate::entry::{DirEntry, EntryType};
use crate::error::{Result, WalkAction, WalkError};
use crate::filter::EntryFilter;
use crate::paths;
use crate::reader::{self, ReadError, ReadOptions, SinkFlow};

/// One directory awaiting a worker.
#[derive(Debug, Clone)]
pub(crate) struct WorkItem {
    /// Path used to open the directory (also the callback path).
    pub dir: PathBuf,

    /// Handle for the directory itself.
    pub entry: DirEntry,

    /// The callback already ran for this directory (a traversed
    /// symlink was delivered as a symlink first); don't run it again.
    pub callback_done: bool,
}

pub(crate) struct WorkerCtx<'scope, F> {
    pub id: usize,
    pub config: &'scope WalkConfig,
    pub callback: &'scope F,
    pub filter: Option<&'scope EntryFilter>,
    pub work_rx: Receiver<WorkItem>,
    pub enqueue_tx: Sender<WorkItem>,
    pub result_tx: Sender<Result<()>>,
    pub done_rx: Receiver<()>,
}

/// Main worker loop: wait for work or termination, process, report.
pub(crate) fn run<F>(ctx: WorkerCtx<'_, F>)
where
    F: Fn(&Path, &DirEntry, Option<WalkError>) -> Result<WalkAction> + Send + Sync,
{
    trace!(worker = ctx.id, "worker starting");
    loop {
        let item = select! {
            recv(ctx.done_rx) -> _ => break,
            recv(ctx.work_rx) -> msg => match msg {
                Ok(item) => item,
                Err(_) => break,
            },
        };

        let result = ctx.process(&item);

        // Abort the send if termination wins the race; the coordinator
        // is no longer draining results.
        select! {
            recv(ctx.done_rx) -> _ => break,
            send(ctx.result_tx, result) -> sent => {
                if sent.is_err() {
                    break;
                }
            },
        }
    }
    trace!(worker = ctx.id, "worker exiting");
}

impl<F> WorkerCtx<'_, F>
where
    F: Fn(&Path, &DirEntry, Option<WalkError>) -> Result<WalkAction> + Send + Sync,
{
    /// Walk one directory: pre-read callback, read, per-entry dispatch.
    fn process(&self, item: &WorkItem) -> Result<()> {
        let mut skip_files = false;
        if !item.callback_done {
            match (self.callback)(&item.dir, &item.entry, None)? {
                WalkAction::SkipDir => return Ok(()),
                WalkAction::SkipFiles => skip_files = true,
                WalkAction::Continue | WalkAction::TraverseLink => {}
            }
        }

        let opts = ReadOptions {
            sort: self.config.sort,
            skip_files,
            depth: item.entry.depth() + 1,
        };
        let read = reader::read_dir(&item.dir, &opts, &mut |entry| {
            self.on_entry(&item.dir, entry)
        });
        match read {
            Ok(()) => {
                trace!(worker = self.id, dir = %item.dir.display(), "directory processed");
                Ok(())
            }
            Err(ReadError::Sink(err)) => Err(err),
            Err(ReadError::Dir(err)) => {
                // Second callback invocation, reporting the read error;
                // whatever it returns decides the walk's fate.
                debug!(worker = self.id, dir = %item.dir.display(), error = %err, "directory read failed");
                (self.callback)(&item.dir, &item.entry, Some(err)).map(|_| ())
            }
        }
    }

    /// Dispatch one decoded child entry: enqueue directories, invoke
    /// the callback for leaves, apply the follow-mode contract.
    fn on_entry(&self, dir: &Path, entry: DirEntry) -> Result<SinkFlow> {
        let joined = paths::join_entry(dir, entry.name(), self.config.to_slash);

        match entry.entry_type() {
            EntryType::Symlink if self.filter.is_some() => {
                if let Some(filter) = self.filter {
                    if let Ok(target) = entry.stat() {
                        if target.is_dir() {
                            if !filter.seen_entry(&joined, &entry) {
                                // First sight of the target directory:
                                // hand the subtree to a worker. The
                                // callback runs there, against a
                                // directory-typed entry.
                                let resolved = entry.resolve_to_dir(target);
                                self.enqueue(WorkItem {
                                    dir: joined,
                                    entry: resolved,
                                    callback_done: false,
                                });
                                return Ok(SinkFlow::Continue);
                            }
                            // Target already visited: the link itself
                            // is still delivered, as a symlink leaf.
                            return self.invoke_leaf(&joined, &entry);
                        }
                    }
                }
                // Target is not a directory or cannot be resolved.
                self.invoke_leaf(&joined, &entry)
            }
            EntryType::Directory => {
                let unseen = match self.filter {
                    Some(filter) => !filter.seen_entry(&joined, &entry),
                    None => true,
                };
                if unseen {
                    // No callback here: the receiving worker invokes it
                    // once, before reading the directory (pre-order).
                    self.enqueue(WorkItem {
                        dir: joined,
                        entry,
                        callback_done: false,
                    });
                }
                Ok(SinkFlow::Continue)
            }
            _ => self.invoke_leaf(&joined, &entry),
        }
    }

    /// Run the callback for a non-directory entry and translate its
    /// action into reader flow.
    fn invoke_leaf(&self, path: &Path, entry: &DirEntry) -> Result<SinkFlow> {
        match (self.callback)(path, entry, None)? {
            WalkAction::Continue => Ok(SinkFlow::Continue),
            WalkAction::SkipFiles => Ok(SinkFlow::SkipFiles),
            WalkAction::SkipDir => {
                if entry.entry_type().is_symlink() {
                    // SkipDir on a symlink is plain success.
                    Ok(SinkFlow::Continue)
                } else {
                    Ok(SinkFlow::Stop)
                }
            }
            WalkAction::TraverseLink => {
                if entry.entry_type().is_symlink() && self.filter.is_none() {
                    // One-level opt-in traversal: the callback has
                    // already seen the link, so don't run it again for
                    // the same path as a directory.
                    self.enqueue(WorkItem {
                        dir: path.to_path_buf(),
                        entry: entry.clone(),
                        callback_done: true,
                    });
                }
                Ok(SinkFlow::Continue)
            }
        }
    }

    /// Hand a discovered directory to the coordinator, unless the walk
    /// is already terminating.
    fn enqueue(&self, item: WorkItem) {
        select! {
            send(self.enqueue_tx, item) -> _ => {},
            recv(self.done_rx) -> _ => {},
        }
    }
}
