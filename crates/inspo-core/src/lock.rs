//! Cross-process write lock for the item file.
//!
//! A writer holds an exclusive `fs2` lock on a sidecar `<items>.lock` file
//! for the whole read, change and rename cycle. Readers never lock: the item
//! file is only ever replaced by a rename, so a read sees one whole board.

use crate::error::ErrorCode;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another writer kept the lock for the whole timeout.
    #[error("{} is held by another writer (waited {waited:?})", path.display())]
    Busy { path: PathBuf, waited: Duration },

    #[error("cannot lock {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Busy { .. } => ErrorCode::LockContention,
            Self::Open { .. } => ErrorCode::StoreWriteFailed,
        }
    }
}

/// Sidecar lock file guarding `item_file`.
#[must_use]
pub fn lock_path_for(item_file: &Path) -> PathBuf {
    let mut name = item_file.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    item_file.with_file_name(name)
}

/// Exclusive hold on an item file; released on drop.
#[derive(Debug)]
pub struct ItemFileLock {
    file: File,
    lock_path: PathBuf,
}

impl ItemFileLock {
    /// Lock `item_file`, retrying until `timeout` runs out.
    pub fn acquire(item_file: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = lock_path_for(item_file);
        let open_err = |source| LockError::Open {
            path: lock_path.clone(),
            source,
        };
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(open_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(open_err)?;

        let contended = fs2::lock_contended_error().raw_os_error();
        let start = Instant::now();
        loop {
            match fs2::FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    trace!(path = %lock_path.display(), waited = ?start.elapsed(), "item file locked");
                    return Ok(Self { file, lock_path });
                }
                Err(err) if err.raw_os_error() == contended => {}
                Err(source) => return Err(open_err(source)),
            }

            let waited = start.elapsed();
            if waited >= timeout {
                debug!(path = %lock_path.display(), ?waited, "gave up waiting for item file lock");
                return Err(LockError::Busy {
                    path: lock_path,
                    waited,
                });
            }
            thread::sleep(RETRY_INTERVAL.min(timeout - waited));
        }
    }

    #[must_use]
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for ItemFileLock {
    fn drop(&mut self) {
        if let Err(err) = fs2::FileExt::unlock(&self.file) {
            debug!(path = %self.lock_path.display(), error = %err, "unlock failed; closing releases it");
        }
    }
}
