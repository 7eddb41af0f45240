//! Raw batched directory reads (Linux)
//!
//! Opens the directory read-only and drains it with `getdents64` into
//! a pooled 32 KiB buffer, decoding records with the dirent codec.
//! Both the open and the read retry on EINTR. The descriptor is closed
//! on every exit path and the buffer returned to the pool.

use std::ffi::CString;
use std::io;
use std::ops::{Deref, DerefMut};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dirent::{self, Parsed};
use crate::entry::DirEntry;
use crate::error::WalkError;
use crate::reader::{EntrySink, ReadError, SinkFlow};

/// Empirically 32 KiB is the sweet spot for getdents batches.
const DIRENT_BUF_SIZE: usize = 32 * 1024;

/// Buffers retained across reads; returns above this are discarded so
/// a burst of workers does not pin memory forever.
const MAX_POOLED_BUFS: usize = 64;

static BUF_POOL: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

struct PooledBuf {
    buf: Vec<u8>,
}

impl PooledBuf {
    fn get() -> Self {
        let buf = BUF_POOL
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0u8; DIRENT_BUF_SIZE]);
        Self { buf }
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        let mut pool = BUF_POOL.lock();
        if pool.len() < MAX_POOLED_BUFS {
            pool.push(std::mem::take(&mut self.buf));
        }
    }
}

impl Deref for PooledBuf {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

/// Owned descriptor, closed on drop.
struct Fd(libc::c_int);

impl Drop for Fd {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.0);
        }
    }
}

fn open_dir(dir: &Path) -> io::Result<Fd> {
    let cpath = CString::new(dir.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"))?;
    loop {
        let fd = unsafe {
            libc::open(
                cpath.as_ptr(),
                libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC,
            )
        };
        if fd >= 0 {
            return Ok(Fd(fd));
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(err);
        }
    }
}

fn read_dirents(fd: &Fd, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        let n = unsafe {
            libc::syscall(
                libc::SYS_getdents64,
                fd.0,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
            )
        };
        if n >= 0 {
            return Ok(n as usize);
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(err);
        }
    }
}

pub(super) fn read_dir_raw(
    dir: &Path,
    depth: usize,
    skip_files: bool,
    sink: &mut EntrySink<'_>,
) -> Result<(), ReadError> {
    let fd = open_dir(dir).map_err(|e| ReadError::Dir(WalkError::open(dir, e)))?;

    let mut buf = PooledBuf::get();
    let parent = Arc::new(dir.to_path_buf());
    let mut skip_files = skip_files;

    loop {
        let n = read_dirents(&fd, &mut buf).map_err(|e| ReadError::Dir(WalkError::readdir(dir, e)))?;
        if n == 0 {
            return Ok(());
        }

        let mut rest = &buf[..n];
        while !rest.is_empty() {
            let (consumed, parsed) = dirent::parse(rest);
            let (name, typ) = match parsed {
                // A malformed record is end-of-directory; consuming
                // zero bytes and continuing would loop forever.
                Parsed::Stop => return Ok(()),
                Parsed::Skip => {
                    rest = &rest[consumed..];
                    continue;
                }
                Parsed::Entry { name, typ } => {
                    rest = &rest[consumed..];
                    (name, typ)
                }
            };

            if name == b"." || name == b".." {
                continue;
            }
            if skip_files && typ.is_file() {
                continue;
            }

            let entry = DirEntry::new(
                Arc::clone(&parent),
                std::ffi::OsStr::from_bytes(name).to_os_string(),
                typ,
                depth,
            );
            match sink(entry).map_err(ReadError::Sink)? {
                SinkFlow::Continue => {}
                SinkFlow::SkipFiles => skip_files = true,
                SinkFlow::Stop => return Ok(()),
            }
        }
    }
}
