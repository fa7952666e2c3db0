//! The contract between the item store and the document database behind it.

use super::record::Document;
use crate::error::ErrorCode;
use crate::lock::LockError;
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

/// Every document in the backend, keyed by item id.
pub type Snapshot = BTreeMap<String, Document>;

/// Callback invoked with a full snapshot after each committed change.
pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Handle identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

/// Errors surfaced by a backend or the store on top of it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document exists under this id.
    #[error("no item with id {0}")]
    NotFound(String),

    /// Filesystem failure reading or writing the store.
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),

    /// Lock acquisition failed.
    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// The stored data (or a value being written) is not valid JSON of the expected shape.
    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The filesystem watcher behind a subscription could not be started.
    #[error("cannot watch store for changes: {0}")]
    Watch(#[from] notify::Error),

    /// A mutex guarding backend state was poisoned by a panicking thread.
    #[error("store state poisoned")]
    Poisoned,
}

impl StoreError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::ItemNotFound,
            Self::Io(_) => ErrorCode::StoreWriteFailed,
            Self::Lock(err) => err.code(),
            Self::Encoding(_) => ErrorCode::CorruptRecord,
            Self::Watch(_) => ErrorCode::StoreReadFailed,
            Self::Poisoned => ErrorCode::InternalUnexpected,
        }
    }
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// A document database holding one JSON object per item.
///
/// Implementations must notify watchers after the change is committed and
/// without holding internal locks, since a listener may call straight back
/// into the backend. Changes committed by other writers to the same
/// underlying store are delivered too, possibly from another thread.
pub trait Backend: Send + Sync {
    /// Reserve a fresh, time-ordered id for a new document.
    fn allocate_id(&self) -> Result<String, StoreError>;

    /// Write a whole document under `id`, replacing any previous one.
    fn put(&self, id: &str, doc: Document) -> Result<(), StoreError>;

    /// Merge top-level fields into the existing document under `id`.
    fn merge(&self, id: &str, fields: Document) -> Result<(), StoreError>;

    /// Delete the document under `id`. Deleting a missing id is not an error.
    fn remove(&self, id: &str) -> Result<(), StoreError>;

    /// Read every document.
    fn snapshot(&self) -> Result<Snapshot, StoreError>;

    /// Register a listener. It fires once right away with the current
    /// snapshot, then after every change.
    fn watch(&self, listener: Listener) -> Result<WatchId, StoreError>;

    /// Remove a listener. Unknown or already-removed ids are ignored.
    fn unwatch(&self, id: WatchId);
}

/// Listener registry shared by the bundled backends.
#[derive(Default)]
pub struct Listeners {
    inner: Mutex<ListenerTable>,
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: Vec<(WatchId, Listener)>,
}

impl Listeners {
    pub fn add(&self, listener: Listener) -> Result<WatchId, StoreError> {
        let mut table = self.inner.lock()?;
        let id = WatchId(table.next_id);
        table.next_id += 1;
        table.entries.push((id, listener));
        Ok(id)
    }

    pub fn remove(&self, id: WatchId) -> bool {
        let Ok(mut table) = self.inner.lock() else {
            return false;
        };
        let before = table.entries.len();
        table.entries.retain(|(entry_id, _)| *entry_id != id);
        table.entries.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map_or(0, |table| table.entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener with `snapshot`.
    ///
    /// The registry lock is released before any callback runs.
    pub fn notify(&self, snapshot: &Snapshot) {
        let listeners: Vec<Listener> = match self.inner.lock() {
            Ok(table) => table.entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        tracing::debug!(
            listeners = listeners.len(),
            documents = snapshot.len(),
            "notifying watchers"
        );
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}
