//! Walk coordinator - owns the pending stack and the termination race
//!
//! The coordinator is single-threaded and owns all mutable walk state:
//! the LIFO stack of pending directories and the count of directories
//! handed to workers but not yet reported. Workers never touch the
//! stack; they send discoveries back over a bounded channel. This
//! topology (instead of a work-stealing pool) is what makes the
//! termination condition checkable in one place.

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use tracing::{debug, trace};

use crate::config::WalkConfig;
use crate::entry::DirEntry;
use crate::error::{Result, WalkAction, WalkError};
use crate::filter::EntryFilter;
use crate::paths;
use crate::walker::worker::{self, WorkItem, WorkerCtx};

/// Walk the tree rooted at `root`, calling `walk_fn` once for every
/// entry discovered, including `root` itself.
///
/// The callback runs on the worker threads and may be invoked
/// concurrently for different entries; it must be `Send + Sync`. The
/// callback for a directory always runs before the callbacks for any
/// of its children, but no order is guaranteed between siblings
/// (unless [`sort`](crate::WalkConfig::sort) is set) or across
/// directories.
///
/// When `walk` returns, all workers have been joined: no callback
/// invocation happens after the return, and the first error produced
/// by a callback or an unabsorbed directory read is the return value.
pub fn walk<P, F>(config: &WalkConfig, root: P, walk_fn: F) -> Result<()>
where
    P: AsRef<Path>,
    F: Fn(&Path, &DirEntry, Option<WalkError>) -> Result<WalkAction> + Send + Sync,
{
    let mut root = paths::clean_root(root.as_ref());
    if config.to_slash {
        root = paths::to_slash(root);
    }

    let md = fs::symlink_metadata(&root).map_err(|source| WalkError::RootStat {
        path: root.clone(),
        source,
    })?;

    let num_workers = config.resolved_workers();
    debug!(root = %root.display(), workers = num_workers, follow = config.follow, "starting walk");

    // Channel capacities follow the worker count: enough slack that a
    // worker is never parked on a buffered send during the shutdown
    // handshake.
    let (work_tx, work_rx) = bounded::<WorkItem>(num_workers);
    let (enqueue_tx, enqueue_rx) = bounded::<WorkItem>(num_workers);
    let (result_tx, result_rx) = bounded::<Result<()>>(num_workers);
    // Nothing is ever sent on `done`; dropping the sender is the
    // broadcast that unparks every worker.
    let (done_tx, done_rx) = bounded::<()>(0);

    let filter = config.follow.then(EntryFilter::new);

    let root_name: OsString = root
        .file_name()
        .unwrap_or_else(|| root.as_os_str())
        .to_os_string();
    let root_parent = Arc::new(
        root.parent()
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf(),
    );
    let root_entry = DirEntry::from_metadata(root_parent, root_name, md, 0);

    let pending = vec![WorkItem {
        dir: root,
        entry: root_entry,
        callback_done: false,
    }];

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let ctx = WorkerCtx {
                id,
                config,
                callback: &walk_fn,
                filter: filter.as_ref(),
                work_rx: work_rx.clone(),
                enqueue_tx: enqueue_tx.clone(),
                result_tx: result_tx.clone(),
                done_rx: done_rx.clone(),
            };
            let spawned = thread::Builder::new()
                .name(format!("walker-{id}"))
                .spawn_scoped(scope, move || worker::run(ctx));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    drop(done_tx);
                    drop(work_tx);
                    return Err(WalkError::Spawn { id, source });
                }
            }
        }

        let outcome = coordinate(&work_tx, &enqueue_rx, &result_rx, pending);

        // Closing `done` (and the work channel) releases every worker;
        // joining them before returning guarantees no callback runs
        // after `walk` is done.
        drop(done_tx);
        drop(work_tx);
        for handle in handles {
            let _ = handle.join();
        }

        debug!(ok = outcome.is_ok(), "walk finished");
        outcome
    })
}

enum Event {
    Dispatched,
    Enqueued(WorkItem),
    Completed(Result<()>),
}

/// The coordinator loop. Repeats until the tree is exhausted or a
/// worker reports an error:
/// 1. offer the top of the pending stack to an idle worker (only when
///    the stack is non-empty),
/// 2. accept a newly discovered directory,
/// 3. accept a per-directory completion.
fn coordinate(
    work_tx: &Sender<WorkItem>,
    enqueue_rx: &Receiver<WorkItem>,
    result_rx: &Receiver<Result<()>>,
    mut pending: Vec<WorkItem>,
) -> Result<()> {
    let mut in_flight: usize = 0;

    loop {
        let event = if let Some(next) = pending.last() {
            let offered = next.clone();
            select! {
                send(work_tx, offered) -> sent => match sent {
                    Ok(()) => Event::Dispatched,
                    Err(_) => return Err(WalkError::ChannelClosed),
                },
                recv(enqueue_rx) -> item => {
                    Event::Enqueued(item.map_err(|_| WalkError::ChannelClosed)?)
                }
                recv(result_rx) -> res => {
                    Event::Completed(res.map_err(|_| WalkError::ChannelClosed)?)
                }
            }
        } else {
            select! {
                recv(enqueue_rx) -> item => {
                    Event::Enqueued(item.map_err(|_| WalkError::ChannelClosed)?)
                }
                recv(result_rx) -> res => {
                    Event::Completed(res.map_err(|_| WalkError::ChannelClosed)?)
                }
            }
        };

        match event {
            Event::Dispatched => {
                pending.pop();
                in_flight += 1;
            }
            Event::Enqueued(item) => {
                trace!(dir = %item.dir.display(), "directory enqueued");
                pending.push(item);
            }
            Event::Completed(result) => {
                in_flight -= 1;
                result?;
                if in_flight == 0 && pending.is_empty() {
                    // A worker may have sent an enqueue immediately
                    // followed by its result, and the result won the
                    // select. Only an empty enqueue buffer means the
                    // walk is really over.
                    match enqueue_rx.try_recv() {
                        Ok(item) => pending.push(item),
                        Err(_) => return Ok(()),
                    }
                }
            }
        }
    }
}
