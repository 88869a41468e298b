// src/manager/lock.rs

//! Package management lock
//!
//! One process at a time may change package state. The lock is an
//! advisory `flock(LOCK_EX)` on `<root>/var/run/zypp.pid`; the holder writes
//! its pid into the file so a conflicting process can name it.
//!
//! Acquisition never waits: either the lock is free right now or the
//! command fails.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Held package management lock, released on drop
#[derive(Debug)]
pub struct PackageLock {
    file: File,
    path: PathBuf,
}

impl PackageLock {
    /// Try to take the lock
    ///
    /// Returns:
    /// - `Ok(Some(lock))` if the lock was acquired
    /// - `Ok(None)` if another process holds it
    /// - `Err` on I/O errors
    pub fn try_acquire<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // no truncation before we own the lock, the pid belongs to the holder
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                file.set_len(0)?;
                writeln!(file, "{}", std::process::id())?;
                info!("Acquired package lock at {:?}", path);
                Ok(Some(Self { file, path }))
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                debug!("Package lock already held at {:?}", path);
                Ok(None)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Take the lock or fail with [`Error::Locked`]
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::try_acquire(path)?.ok_or_else(|| Error::Locked {
            pid: Self::holder_pid(path),
        })
    }

    /// Pid written by the current holder, if readable
    pub fn holder_pid<P: AsRef<Path>>(path: P) -> Option<u32> {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PackageLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.set_len(0) {
            warn!("Failed to clear package lock {:?}: {}", self.path, e);
        }
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release package lock {:?}: {}", self.path, e);
        } else {
            debug!("Released package lock at {:?}", self.path);
        }
    }
}
