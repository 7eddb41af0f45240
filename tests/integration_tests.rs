//! Integration tests for fswalk
//!
//! Trees are described as `(path, contents)` pairs under a temp dir;
//! contents starting with "LINK:" become symlinks. Assertions key on
//! paths relative to the walk root, with `/` separators.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use fswalk::{
    ignore_duplicate_files, ignore_permission_errors, walk, DirEntry, EntryType, SortMode,
    WalkAction, WalkConfig, WalkError,
};
use tempfile::TempDir;

fn build_tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let root = tmp.path();

    let mut links = Vec::new();
    for (path, contents) in files {
        let full: PathBuf = root.join(path.replace('/', std::path::MAIN_SEPARATOR_STR));
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        match contents.strip_prefix("LINK:") {
            Some(target) => links.push((full, target.to_string())),
            None => std::fs::write(&full, contents).expect("write file"),
        }
    }
    // Symlinks last so directory targets exist by the time they are
    // created.
    #[cfg(unix)]
    for (full, target) in links {
        std::os::unix::fs::symlink(target, full).expect("create symlink");
    }
    #[cfg(not(unix))]
    assert!(links.is_empty(), "symlink trees are unix-only tests");

    tmp
}

fn key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/")
}

/// Walk `root` and collect every callback into `(type, count)` per
/// relative key. Read errors fail the walk.
fn walk_collect(
    config: &WalkConfig,
    root: &Path,
) -> fswalk::Result<BTreeMap<String, (EntryType, usize)>> {
    let seen = Mutex::new(BTreeMap::new());
    walk(config, root, |path, entry, read_error| {
        if let Some(err) = read_error {
            return Err(err);
        }
        let mut seen = seen.lock().unwrap();
        let slot = seen
            .entry(key(root, path))
            .or_insert((entry.entry_type(), 0usize));
        slot.1 += 1;
        Ok(WalkAction::Continue)
    })?;
    Ok(seen.into_inner().unwrap())
}

fn assert_keys(got: &BTreeMap<String, (EntryType, usize)>, want: &[&str]) {
    let got_keys: Vec<&str> = got.keys().map(String::as_str).collect();
    assert_eq!(got_keys, want, "visited key set mismatch");
    for (k, (_, count)) in got {
        assert_eq!(*count, 1, "callback ran {count} times for {k:?}");
    }
}

fn worker_counts() -> [usize; 3] {
    [1, 2, 8]
}

// Scenario A: plain coverage.
#[test]
fn test_walk_basic() {
    let tmp = build_tree(&[
        ("foo/foo.go", "one"),
        ("bar/bar.go", "two"),
        ("skip/skip.go", "three"),
    ]);
    for workers in worker_counts() {
        let config = WalkConfig {
            num_workers: workers,
            ..WalkConfig::default()
        };
        let got = walk_collect(&config, tmp.path()).unwrap();
        assert_keys(
            &got,
            &[
                "",
                "bar",
                "bar/bar.go",
                "foo",
                "foo/foo.go",
                "skip",
                "skip/skip.go",
            ],
        );
        assert_eq!(got[""].0, EntryType::Directory);
        assert_eq!(got["foo"].0, EntryType::Directory);
        assert_eq!(got["foo/foo.go"].0, EntryType::File);
    }
}

// Scenario B: SkipDir prunes the subtree but the directory itself is
// visited.
#[test]
fn test_walk_skip_dir() {
    let tmp = build_tree(&[
        ("foo/foo.go", "one"),
        ("bar/bar.go", "two"),
        ("skip/skip.go", "three"),
    ]);
    for workers in worker_counts() {
        let config = WalkConfig {
            num_workers: workers,
            ..WalkConfig::default()
        };
        let root = tmp.path();
        let seen = Mutex::new(BTreeMap::new());
        walk(&config, root, |path, entry, read_error| {
            if let Some(err) = read_error {
                return Err(err);
            }
            seen.lock()
                .unwrap()
                .entry(key(root, path))
                .or_insert((entry.entry_type(), 0usize))
                .1 += 1;
            if entry.name() == "skip" {
                return Ok(WalkAction::SkipDir);
            }
            Ok(WalkAction::Continue)
        })
        .unwrap();
        let got = seen.into_inner().unwrap();
        assert_keys(
            &got,
            &["", "bar", "bar/bar.go", "foo", "foo/foo.go", "skip"],
        );
    }
}

// Scenario C: without follow, symlinks are leaves of type Symlink and
// nothing is resolved.
#[cfg(unix)]
#[test]
fn test_walk_symlinks_no_follow() {
    let tmp = build_tree(&[
        ("foo/foo.go", "one"),
        ("bar/bar.go", "LINK:../foo/foo.go"),
        ("symdir", "LINK:foo"),
        ("broken/broken.go", "LINK:../nonexistent"),
    ]);
    let config = WalkConfig::default();
    let got = walk_collect(&config, tmp.path()).unwrap();
    assert_keys(
        &got,
        &[
            "",
            "bar",
            "bar/bar.go",
            "broken",
            "broken/broken.go",
            "foo",
            "foo/foo.go",
            "symdir",
        ],
    );
    assert_eq!(got["bar/bar.go"].0, EntryType::Symlink);
    assert_eq!(got["symdir"].0, EntryType::Symlink);
    assert_eq!(got["broken/broken.go"].0, EntryType::Symlink);
}

// Scenario D: a symlink loop under follow terminates, and no inode is
// delivered twice.
#[cfg(unix)]
#[test]
fn test_walk_follow_cycle() {
    let tmp = build_tree(&[("src/foo.go", "one"), ("src/loop", "LINK:../src")]);
    for workers in worker_counts() {
        let config = WalkConfig {
            follow: true,
            num_workers: workers,
            ..WalkConfig::default()
        };
        let got = walk_collect(&config, tmp.path()).unwrap();
        assert_keys(&got, &["", "src", "src/foo.go", "src/loop"]);
        // The loop link resolves to an already-visited directory, so
        // it is delivered as a symlink leaf, not descended into.
        assert_eq!(got["src/loop"].0, EntryType::Symlink);
        assert_eq!(got["src"].0, EntryType::Directory);
    }
}

// Scenario E: with sorting, one directory's children arrive in order.
#[test]
fn test_walk_sort_lexical() {
    let names = [
        "a.txt", "b.txt", "c.txt", "d.txt", "e.txt", "f.txt", "a.lnk", "b.lnk", "c.lnk", "d.lnk",
        "e.lnk", "f.lnk",
    ];
    let files: Vec<(&str, &str)> = names.iter().map(|n| (*n, "x")).collect();
    let tmp = build_tree(&files);

    let mut want: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    want.sort();

    for workers in worker_counts() {
        let config = WalkConfig {
            sort: SortMode::Lexical,
            num_workers: workers,
            ..WalkConfig::default()
        };
        let order = Mutex::new(Vec::new());
        let root = tmp.path();
        walk(&config, root, |path, _entry, read_error| {
            if let Some(err) = read_error {
                return Err(err);
            }
            if path != root {
                order.lock().unwrap().push(key(root, path));
            }
            Ok(WalkAction::Continue)
        })
        .unwrap();
        assert_eq!(order.into_inner().unwrap(), want);
    }
}

// Scenario F: a callback error terminates the walk and comes back
// intact, whatever the worker count.
#[test]
fn test_walk_callback_error() {
    #[derive(Debug, PartialEq)]
    struct ErrExpected;
    impl std::fmt::Display for ErrExpected {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("expected sentinel error")
        }
    }
    impl std::error::Error for ErrExpected {}

    let tmp = build_tree(&[
        ("a/a.go", "x"),
        ("b/b.go", "x"),
        ("c/c.go", "x"),
        ("d/d.go", "x"),
    ]);
    for workers in worker_counts() {
        let config = WalkConfig {
            num_workers: workers,
            ..WalkConfig::default()
        };
        let err = walk(&config, tmp.path(), |path, _entry, _read_error| {
            if path.extension().is_some_and(|e| e == "go") {
                return Err(WalkError::callback(ErrExpected));
            }
            Ok(WalkAction::Continue)
        })
        .expect_err("walk must fail");
        assert_eq!(err.downcast_ref::<ErrExpected>(), Some(&ErrExpected));
    }
}

// Property 4: SkipFiles suppresses the remaining regular files of one
// directory; subdirectories are unaffected.
#[test]
fn test_walk_skip_files() {
    let tmp = build_tree(&[
        ("f1.go", "x"),
        ("f2.go", "x"),
        ("f3.go", "x"),
        ("sub/inner.go", "x"),
    ]);
    let config = WalkConfig {
        sort: SortMode::Lexical,
        ..WalkConfig::default()
    };
    let root = tmp.path();
    let seen = Mutex::new(Vec::new());
    walk(&config, root, |path, _entry, read_error| {
        if let Some(err) = read_error {
            return Err(err);
        }
        let k = key(root, path);
        seen.lock().unwrap().push(k.clone());
        if k == "f1.go" {
            return Ok(WalkAction::SkipFiles);
        }
        Ok(WalkAction::Continue)
    })
    .unwrap();

    let mut got = seen.into_inner().unwrap();
    got.sort();
    assert_eq!(got, ["", "f1.go", "sub", "sub/inner.go"]);
}

// SkipFiles returned at a directory's own visit suppresses all of its
// regular files.
#[test]
fn test_walk_skip_files_at_directory() {
    let tmp = build_tree(&[
        ("noisy/a.go", "x"),
        ("noisy/b.go", "x"),
        ("noisy/sub/keep.go", "x"),
        ("quiet/c.go", "x"),
    ]);
    let config = WalkConfig::default();
    let root = tmp.path();
    let seen = Mutex::new(Vec::new());
    walk(&config, root, |path, _entry, read_error| {
        if let Some(err) = read_error {
            return Err(err);
        }
        let k = key(root, path);
        seen.lock().unwrap().push(k.clone());
        if k == "noisy" {
            return Ok(WalkAction::SkipFiles);
        }
        Ok(WalkAction::Continue)
    })
    .unwrap();

    let mut got = seen.into_inner().unwrap();
    got.sort();
    assert_eq!(
        got,
        ["", "noisy", "noisy/sub", "noisy/sub/keep.go", "quiet", "quiet/c.go"]
    );
}

// Property 2: pre-order - a directory's callback happens strictly
// before any callback beneath it.
#[test]
fn test_walk_pre_order() {
    let tmp = build_tree(&[
        ("a/b/c/d/deep.go", "x"),
        ("a/b/side.go", "x"),
        ("a/top.go", "x"),
        ("e/f/other.go", "x"),
    ]);
    for workers in worker_counts() {
        let config = WalkConfig {
            num_workers: workers,
            ..WalkConfig::default()
        };
        let root = tmp.path();
        let order = Mutex::new(Vec::new());
        walk(&config, root, |path, _entry, read_error| {
            if let Some(err) = read_error {
                return Err(err);
            }
            order.lock().unwrap().push(key(root, path));
            Ok(WalkAction::Continue)
        })
        .unwrap();

        let order = order.into_inner().unwrap();
        for (idx, k) in order.iter().enumerate() {
            if let Some(slash) = k.rfind('/') {
                let parent = &k[..slash];
                let parent_idx = order
                    .iter()
                    .position(|o| o == parent)
                    .unwrap_or_else(|| panic!("parent of {k:?} never visited"));
                assert!(parent_idx < idx, "{parent:?} visited after child {k:?}");
            }
        }
    }
}

// Property 6: nothing runs after walk returns.
#[test]
fn test_no_callbacks_after_return() {
    let files: Vec<(String, &str)> = (0..40)
        .map(|i| (format!("d{}/f{}.go", i % 8, i), "x"))
        .collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), *c)).collect();
    let tmp = build_tree(&refs);

    let calls = AtomicU64::new(0);
    let config = WalkConfig {
        num_workers: 8,
        ..WalkConfig::default()
    };
    walk(&config, tmp.path(), |_path, _entry, _read_error| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(WalkAction::Continue)
    })
    .unwrap();

    let at_return = calls.load(Ordering::SeqCst);
    std::thread::sleep(std::time::Duration::from_millis(100));
    assert_eq!(calls.load(Ordering::SeqCst), at_return);
}

// TraverseLink opts a symlink into one-level traversal without follow
// mode; the link is not delivered a second time as a directory.
#[cfg(unix)]
#[test]
fn test_walk_traverse_link() {
    let tmp = build_tree(&[("foo/foo.go", "x"), ("symdir", "LINK:foo")]);
    let config = WalkConfig::default();
    let root = tmp.path();
    let seen = Mutex::new(BTreeMap::new());
    walk(&config, root, |path, _entry, read_error| {
        if let Some(err) = read_error {
            return Err(err);
        }
        let k = key(root, path);
        *seen.lock().unwrap().entry(k.clone()).or_insert(0usize) += 1;
        if k == "symdir" {
            return Ok(WalkAction::TraverseLink);
        }
        Ok(WalkAction::Continue)
    })
    .unwrap();

    let got = seen.into_inner().unwrap();
    assert_eq!(got.get("symdir"), Some(&1), "{got:?}");
    assert_eq!(got.get("symdir/foo.go"), Some(&1), "{got:?}");
    assert_eq!(got.get("foo/foo.go"), Some(&1), "{got:?}");
}

// Property 5: under follow, each distinct inode is delivered at most
// once however many links point at it.
#[cfg(unix)]
#[test]
fn test_walk_follow_dedupes_directories() {
    let tmp = build_tree(&[
        ("target/x.go", "x"),
        ("l1", "LINK:target"),
        ("l2", "LINK:target"),
    ]);
    for workers in worker_counts() {
        let config = WalkConfig {
            follow: true,
            num_workers: workers,
            ..WalkConfig::default()
        };
        let got = walk_collect(&config, tmp.path()).unwrap();

        // Exactly one path delivers the x.go inode.
        let x_count: usize = got
            .iter()
            .filter(|(k, _)| k.ends_with("x.go"))
            .map(|(_, (_, c))| c)
            .sum();
        assert_eq!(x_count, 1, "{got:?}");

        // The target directory's subtree is entered exactly once; the
        // other two names for it surface as symlink leaves (or, for
        // the plain name, not at all when a link won the race).
        let dir_count = got
            .values()
            .filter(|(t, _)| *t == EntryType::Directory)
            .count();
        assert_eq!(dir_count, 2, "root + one entry into target: {got:?}");
        for (_, count) in got.values() {
            assert_eq!(*count, 1);
        }
    }
}

// The duplicate-files adapter dedupes by inode without follow mode.
#[cfg(unix)]
#[test]
fn test_ignore_duplicate_files_adapter() {
    let tmp = build_tree(&[
        ("target/x.go", "x"),
        ("l1", "LINK:target"),
        ("l2", "LINK:target"),
    ]);
    let config = WalkConfig::default();
    let root = tmp.path();
    let seen = Mutex::new(Vec::new());
    walk(
        &config,
        root,
        ignore_duplicate_files(|path, _entry, read_error| {
            if let Some(err) = read_error {
                return Err(err);
            }
            seen.lock().unwrap().push(key(root, path));
            Ok(WalkAction::Continue)
        }),
    )
    .unwrap();

    let got = seen.into_inner().unwrap();
    let x_count = got.iter().filter(|k| k.ends_with("x.go")).count();
    assert_eq!(x_count, 1, "{got:?}");
}

// Walking a missing root fails synchronously with the stat error.
#[test]
fn test_walk_root_missing() {
    let config = WalkConfig::default();
    let err = walk(
        &config,
        "/nonexistent-fswalk-integration-test",
        |_path, _entry, _read_error| Ok(WalkAction::Continue),
    )
    .expect_err("walk of missing root must fail");
    assert!(matches!(err, WalkError::RootStat { .. }), "{err:?}");
}

// Trailing separators on the root are cleaned before the walk starts,
// so callback paths never carry a doubled separator.
#[cfg(unix)]
#[test]
fn test_walk_root_trailing_separator() {
    let tmp = build_tree(&[("foo/foo.go", "x")]);
    let config = WalkConfig::default();
    let with_slash = format!("{}//", tmp.path().display());
    let root = tmp.path();
    let seen = Mutex::new(Vec::new());
    walk(&config, Path::new(&with_slash), |path, _entry, read_error| {
        if let Some(err) = read_error {
            return Err(err);
        }
        assert!(
            !path.to_string_lossy().contains("//"),
            "uncleaned separator in {path:?}"
        );
        seen.lock().unwrap().push(key(root, path));
        Ok(WalkAction::Continue)
    })
    .unwrap();
    let mut got = seen.into_inner().unwrap();
    got.sort();
    assert_eq!(got, ["", "foo", "foo/foo.go"]);
}

// An unreadable directory surfaces as read_error; the adapter absorbs
// it and the walk carries on.
#[cfg(unix)]
#[test]
fn test_walk_permission_denied() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = build_tree(&[("open/ok.go", "x"), ("locked/secret.go", "x")]);
    let locked = tmp.path().join("locked");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    // Running as root the chmod is ineffective; skip the assertions.
    let denied = std::fs::read_dir(&locked).is_err();

    let config = WalkConfig::default();
    let root = tmp.path();

    if denied {
        let err = walk_collect(&config, root).expect_err("read error must propagate");
        assert!(err.is_permission_denied(), "{err:?}");

        let seen = Mutex::new(Vec::new());
        walk(
            &config,
            root,
            ignore_permission_errors(|path, _entry, read_error| {
                if let Some(err) = read_error {
                    return Err(err);
                }
                seen.lock().unwrap().push(key(root, path));
                Ok(WalkAction::Continue)
            }),
        )
        .unwrap();
        let mut got = seen.into_inner().unwrap();
        got.sort();
        assert_eq!(got, ["", "locked", "open", "open/ok.go"]);
    }

    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
}

// Entry depths count from the root.
#[test]
fn test_walk_depths() {
    let tmp = build_tree(&[("a/b/c.go", "x")]);
    let config = WalkConfig {
        num_workers: 1,
        ..WalkConfig::default()
    };
    let root = tmp.path();
    let depths = Mutex::new(BTreeMap::new());
    walk(&config, root, |path, entry: &DirEntry, read_error| {
        if let Some(err) = read_error {
            return Err(err);
        }
        depths
            .lock()
            .unwrap()
            .insert(key(root, path), entry.depth());
        Ok(WalkAction::Continue)
    })
    .unwrap();

    let depths = depths.into_inner().unwrap();
    assert_eq!(depths[""], 0);
    assert_eq!(depths["a"], 1);
    assert_eq!(depths["a/b"], 2);
    assert_eq!(depths["a/b/c.go"], 3);
}

// An empty directory yields exactly one callback, for the root.
#[test]
fn test_walk_empty_root() {
    let tmp = tempfile::tempdir().unwrap();
    let config = WalkConfig::default();
    let got = walk_collect(&config, tmp.path()).unwrap();
    assert_keys(&got, &[""]);
    assert_eq!(got[""].0, EntryType::Directory);
}

// A large flat directory exercises multi-batch reads end to end.
#[test]
fn test_walk_wide_directory() {
    let files: Vec<(String, &str)> = (0..1500)
        .map(|i| (format!("file-with-a-long-name-{i:05}.dat"), "x"))
        .collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), *c)).collect();
    let tmp = build_tree(&refs);

    let config = WalkConfig {
        num_workers: 4,
        ..WalkConfig::default()
    };
    let got = walk_collect(&config, tmp.path()).unwrap();
    assert_eq!(got.len(), 1501, "root + 1500 files");
}
