//! Path assembly helpers
//!
//! Callback paths are built as `dir + separator + name` from the path
//! used to open the containing directory; nothing is normalized after
//! the fact. The only massaging is `clean_root`, applied once to the
//! user-supplied root.

use std::ffi::OsStr;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Remove trailing separators from `root` and collapse a run of
/// leading separators to one. Platform prefixes (drive letters, UNC
/// roots) are preserved verbatim, which on such hosts makes this the
/// identity.
pub(crate) fn clean_root(root: &Path) -> PathBuf {
    #[cfg(unix)]
    {
        use std::ffi::OsString;
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let bytes = root.as_os_str().as_bytes();
        if bytes.is_empty() {
            return root.to_path_buf();
        }
        let mut end = bytes.len();
        while end > 1 && bytes[end - 1] == b'/' {
            end -= 1;
        }
        let trimmed = &bytes[..end];
        let leading = trimmed.iter().take_while(|&&c| c == b'/').count();
        if leading > 1 {
            let mut out = Vec::with_capacity(trimmed.len() - leading + 1);
            out.push(b'/');
            out.extend_from_slice(&trimmed[leading..]);
            return PathBuf::from(OsString::from_vec(out));
        }
        PathBuf::from(OsString::from_vec(trimmed.to_vec()))
    }
    #[cfg(not(unix))]
    {
        root.to_path_buf()
    }
}

fn ends_with_separator(dir: &OsStr) -> bool {
    let s = dir.to_string_lossy();
    s.ends_with('/') || s.ends_with(MAIN_SEPARATOR)
}

/// `dir + separator + name`. No separator is inserted when `dir`
/// already ends with one (a root of "/" must not yield "//"). With
/// `to_slash` the separator is always `/`.
pub(crate) fn join_entry(dir: &Path, name: &OsStr, to_slash: bool) -> PathBuf {
    let dir = dir.as_os_str();
    let mut joined = std::ffi::OsString::with_capacity(dir.len() + name.len() + 1);
    joined.push(dir);
    if !dir.is_empty() && !ends_with_separator(dir) {
        if to_slash {
            joined.push("/");
        } else {
            joined.push(MAIN_SEPARATOR.to_string());
        }
    }
    joined.push(name);
    PathBuf::from(joined)
}

/// Convert every separator in `path` to `/`. A no-op on hosts whose
/// native separator already is `/`.
pub(crate) fn to_slash(path: PathBuf) -> PathBuf {
    if MAIN_SEPARATOR == '/' {
        return path;
    }
    match path.into_os_string().into_string() {
        Ok(s) => PathBuf::from(s.replace(MAIN_SEPARATOR, "/")),
        Err(os) => PathBuf::from(os),
    }
}
