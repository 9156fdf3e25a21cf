//! Advisory file lock guarding the specs cache.

use std::{
    fs::{File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fd_lock::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};

/// Lock file handle for the specs cache.
///
/// Writers hold the exclusive guard while they swap templates or remove the
/// cache. Readers hold the shared guard while they scan or copy templates, so
/// they never observe the specs directory mid-swap. Locks are per open file,
/// so two handles in one process exclude each other as well as other
/// processes.
pub struct CacheLock {
    /// Lock file path, kept for error messages.
    path: PathBuf,
    /// Descriptor lock over the lock file.
    lock: RwLock<File>,
}

impl CacheLock {
    /// Open (creating if needed) the lock file. Its parent must exist.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|source| Error::CacheLock {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            lock: RwLock::new(file),
        })
    }

    /// Block until a shared lock is held.
    pub fn shared(&self) -> Result<RwLockReadGuard<'_, File>> {
        self.lock.read().map_err(|source| Error::CacheLock {
            path: self.path.clone(),
            source,
        })
    }

    /// Block until the exclusive lock is held.
    pub fn acquire(&mut self) -> Result<RwLockWriteGuard<'_, File>> {
        self.lock.write().map_err(|source| Error::CacheLock {
            path: self.path.clone(),
            source,
        })
    }

    /// Take the exclusive lock if it is free, returning `None` when held elsewhere.
    pub fn try_acquire(&mut self) -> Result<Option<RwLockWriteGuard<'_, File>>> {
        match self.lock.try_write() {
            Ok(guard) => Ok(Some(guard)),
            Err(error) if error.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(source) => Err(Error::CacheLock {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
