//! Advisory lock held while a process migrates a store file
//!
//! The migration engine assumes a single writer. Bootstrap code takes this
//! lock first so a second process fails fast instead of racing on the
//! metadata table's primary key.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::result::{Error, Result};

/// Exclusive lock on `<db file>.migrate.lock`, released on drop
#[derive(Debug)]
pub struct MigrationLock {
    file: File,
    path: PathBuf,
}

impl MigrationLock {
    /// Lock file path used for a given store file
    pub fn lock_path(db_path: &Path) -> PathBuf {
        let mut name = db_path.as_os_str().to_owned();
        name.push(".migrate.lock");
        PathBuf::from(name)
    }

    /// Try to take the lock without waiting
    pub fn acquire(db_path: &Path) -> Result<Self> {
        let path = Self::lock_path(db_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock_exclusive().map_err(|e| {
            Error::Lock(format!(
                "another process is migrating {} ({}): {}",
                db_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::debug!("Acquired migration lock {}", path.display());
        Ok(Self { file, path })
    }
}

impl Drop for MigrationLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release migration lock {}: {}", self.path.display(), e);
        }
    }
}
