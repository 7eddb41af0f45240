//! fswalk - parallel find-like CLI
//!
//! Entry point for the demo binary: walks one or more roots in
//! parallel and prints every path, with the usual pruning knobs.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fswalk::{ignore_permission_errors, walk, EntryType, SortMode, WalkAction, WalkConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Parallel directory tree walker
#[derive(Parser, Debug)]
#[command(
    name = "fswalk",
    version,
    about = "Walk directory trees in parallel, printing every entry",
    after_help = "EXAMPLES:\n    \
        fswalk src\n    \
        fswalk -L --sort lexical /srv/data\n    \
        fswalk --exclude '\\.git$' --exclude 'node_modules' .\n    \
        fswalk -q -w 16 /"
)]
struct CliArgs {
    /// Directories to walk
    #[arg(value_name = "PATH", default_value = ".")]
    roots: Vec<PathBuf>,

    /// Number of worker threads (0 = auto)
    #[arg(short = 'w', long, default_value_t = 0, value_name = "NUM")]
    workers: usize,

    /// Follow symlinks to directories, visiting each inode once
    #[arg(short = 'L', long)]
    follow: bool,

    /// Per-directory ordering of entries
    #[arg(long, value_enum, default_value = "none")]
    sort: SortArg,

    /// Print paths with '/' separators regardless of platform
    #[arg(long)]
    to_slash: bool,

    /// Prune entries matching this pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    exclude_patterns: Vec<String>,

    /// Quiet mode - print only the summary line
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Verbose output (show read errors as they happen)
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    None,
    Lexical,
    DirsFirst,
    FilesFirst,
}

impl From<SortArg> for SortMode {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::None => SortMode::None,
            SortArg::Lexical => SortMode::Lexical,
            SortArg::DirsFirst => SortMode::DirsFirst,
            SortArg::FilesFirst => SortMode::FilesFirst,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(args.verbose)?;

    let excludes = args
        .exclude_patterns
        .iter()
        .map(|p| regex::Regex::new(p).with_context(|| format!("invalid exclude pattern '{p}'")))
        .collect::<Result<Vec<_>>>()?;

    let config = WalkConfig {
        follow: args.follow,
        num_workers: args.workers,
        sort: args.sort.into(),
        to_slash: args.to_slash,
    };

    let dirs = AtomicU64::new(0);
    let files = AtomicU64::new(0);
    let errors = AtomicU64::new(0);
    let start = Instant::now();

    for root in &args.roots {
        let quiet = args.quiet;
        let verbose = args.verbose;
        let callback = |path: &std::path::Path,
                        entry: &fswalk::DirEntry,
                        read_error: Option<fswalk::WalkError>|
         -> fswalk::Result<WalkAction> {
            if let Some(err) = read_error {
                errors.fetch_add(1, Ordering::Relaxed);
                if verbose {
                    eprintln!("fswalk: {err}");
                }
                return Ok(WalkAction::Continue);
            }

            let display = path.to_string_lossy();
            if excludes.iter().any(|re| re.is_match(&display)) {
                return Ok(if entry.is_dir() {
                    WalkAction::SkipDir
                } else {
                    WalkAction::Continue
                });
            }

            match entry.entry_type() {
                EntryType::Directory => dirs.fetch_add(1, Ordering::Relaxed),
                _ => files.fetch_add(1, Ordering::Relaxed),
            };

            if !quiet {
                let mut out = io::stdout().lock();
                // A closed pipe (e.g. `fswalk | head`) ends the walk.
                if writeln!(out, "{display}").is_err() {
                    return Err(fswalk::WalkError::callback("stdout closed"));
                }
            }
            Ok(WalkAction::Continue)
        };

        walk(&config, root, ignore_permission_errors(callback))
            .with_context(|| format!("walk of '{}' failed", root.display()))?;
    }

    let elapsed = start.elapsed();
    eprintln!(
        "{} dirs, {} files, {} errors in {:.2}s",
        dirs.load(Ordering::Relaxed),
        files.load(Ordering::Relaxed),
        errors.load(Ordering::Relaxed),
        elapsed.as_secs_f64(),
    );
    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
    Ok(())
}
