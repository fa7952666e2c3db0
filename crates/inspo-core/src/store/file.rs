//! A backend that keeps every document in one JSON file.
//!
//! The file holds a single object mapping item id to document. Writes take the
//! item-file lock, re-read the file, apply the change and replace the file
//! through a rename, so a reader sees either the old or the new board, never a
//! torn one. Two processes writing at once serialize on the lock; the later
//! write wins for any field both touched.
//!
//! While anyone is watching, a filesystem watcher on the file's directory
//! picks up writes made by other processes (or other `FileBackend`s on the
//! same path) and delivers them like local ones. A snapshot identical to the
//! last one delivered is dropped, so a local write reaches listeners once even
//! though the watcher sees it too.

use super::backend::{Backend, Listener, Listeners, Snapshot, StoreError, WatchId};
use super::record::Document;
use crate::ids;
use crate::lock::ItemFileLock;
use chrono::Utc;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Default time to wait for another process to release the store lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub struct FileBackend {
    shared: Arc<Shared>,
    lock_timeout: Duration,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

struct Shared {
    path: PathBuf,
    listeners: Listeners,
    delivered: Mutex<Option<Snapshot>>,
}

impl Shared {
    fn read(&self) -> Result<Snapshot, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Snapshot::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Hand `snapshot` to every listener unless it is what they saw last.
    fn publish(&self, snapshot: Snapshot) {
        let fresh = match self.delivered.lock() {
            Ok(last) if last.as_ref() == Some(&snapshot) => false,
            Ok(mut last) => {
                *last = Some(snapshot.clone());
                true
            }
            Err(_) => true,
        };
        if fresh {
            self.listeners.notify(&snapshot);
        }
    }

    fn on_fs_event(&self, event: &Event) {
        let Some(name) = self.path.file_name() else {
            return;
        };
        let relevant = matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) && event.paths.iter().any(|p| p.file_name() == Some(name));
        if !relevant {
            return;
        }
        match self.read() {
            Ok(snapshot) => self.publish(snapshot),
            Err(err) => debug!(path = %self.path.display(), error = %err, "ignoring unreadable item file change"),
        }
    }
}

impl std::fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackend")
            .field("path", &self.shared.path)
            .field("lock_timeout", &self.lock_timeout)
            .field("listeners", &self.shared.listeners)
            .finish_non_exhaustive()
    }
}

impl FileBackend {
    /// Open (without creating) the store at `path`. A missing file reads as an
    /// empty board and is created on first write.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            shared: Arc::new(Shared {
                path: path.into(),
                listeners: Listeners::default(),
                delivered: Mutex::new(None),
            }),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            watcher: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Path of the JSON document file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Write an empty board if no file exists yet.
    pub fn initialize(&self) -> Result<bool, StoreError> {
        if self.path().exists() {
            return Ok(false);
        }
        let _lock = ItemFileLock::acquire(self.path(), self.lock_timeout)?;
        if self.path().exists() {
            return Ok(false);
        }
        self.write_locked(&Snapshot::new())?;
        Ok(true)
    }

    /// Caller holds the [`ItemFileLock`].
    fn write_locked(&self, docs: &Snapshot) -> Result<(), StoreError> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp_name = path.file_name().map(OsString::from).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        let mut file = fs::File::create(&tmp_path)?;
        serde_json::to_writer_pretty(&mut file, docs)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, path)?;
        debug!(path = %path.display(), documents = docs.len(), "store file written");
        Ok(())
    }

    fn commit(
        &self,
        change: impl FnOnce(&mut Snapshot) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let snapshot = {
            let _lock = ItemFileLock::acquire(self.path(), self.lock_timeout)?;
            let mut docs = self.shared.read()?;
            change(&mut docs)?;
            self.write_locked(&docs)?;
            docs
        };
        self.shared.publish(snapshot);
        Ok(())
    }

    /// Start the directory watcher if it is not running yet.
    fn ensure_watching(&self) -> Result<(), StoreError> {
        let mut slot = self.watcher.lock()?;
        if slot.is_some() {
            return Ok(());
        }
        let dir = match self.path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let shared = Arc::clone(&self.shared);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => shared.on_fs_event(&event),
            Err(err) => warn!(error = %err, "item file watcher error"),
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!(dir = %dir.display(), "watching item file directory");
        *slot = Some(watcher);
        Ok(())
    }
}

impl Backend for FileBackend {
    fn allocate_id(&self) -> Result<String, StoreError> {
        Ok(ids::push_id(Utc::now()))
    }

    fn put(&self, id: &str, doc: Document) -> Result<(), StoreError> {
        self.commit(|docs| {
            docs.insert(id.to_string(), doc);
            Ok(())
        })
    }

    fn merge(&self, id: &str, fields: Document) -> Result<(), StoreError> {
        self.commit(|docs| {
            let doc = docs
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            doc.extend(fields);
            Ok(())
        })
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.commit(|docs| {
            docs.remove(id);
            Ok(())
        })
    }

    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        self.shared.read()
    }

    fn watch(&self, listener: Listener) -> Result<WatchId, StoreError> {
        self.ensure_watching()?;
        let id = self.shared.listeners.add(listener.clone())?;
        let current = self.snapshot()?;
        {
            let mut delivered = self.shared.delivered.lock()?;
            if delivered.is_none() {
                *delivered = Some(current.clone());
            }
        }
        listener(&current);
        Ok(id)
    }

    fn unwatch(&self, id: WatchId) {
        self.shared.listeners.remove(id);
        if !self.shared.listeners.is_empty() {
            return;
        }
        let stopped = self
            .watcher
            .lock()
            .is_ok_and(|mut slot| slot.take().is_some());
        if stopped {
            debug!(path = %self.path().display(), "last listener gone; watcher stopped");
        }
        if let Ok(mut delivered) = self.shared.delivered.lock() {
            *delivered = None;
        }
    }
}
