use super::backend::{Backend, Listener, Listeners, Snapshot, StoreError, WatchId};
use super::record::Document;
use crate::ids;
use chrono::Utc;
use std::sync::Mutex;

/// An in-process backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    docs: Mutex<Snapshot>,
    listeners: Listeners,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with existing documents, e.g. legacy records in tests.
    #[must_use]
    pub fn with_documents(docs: Snapshot) -> Self {
        Self {
            docs: Mutex::new(docs),
            listeners: Listeners::default(),
        }
    }

    /// Apply `change` under the lock, then notify with the resulting snapshot.
    fn commit<T>(
        &self,
        change: impl FnOnce(&mut Snapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let (out, snapshot) = {
            let mut docs = self.docs.lock()?;
            let out = change(&mut docs)?;
            (out, docs.clone())
        };
        self.listeners.notify(&snapshot);
        Ok(out)
    }
}

impl Backend for MemoryBackend {
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
        Ok(self.docs.lock()?.clone())
    }

    fn watch(&self, listener: Listener) -> Result<WatchId, StoreError> {
        let id = self.listeners.add(listener.clone())?;
        let current = self.snapshot()?;
        listener(&current);
        Ok(id)
    }

    fn unwatch(&self, id: WatchId) {
        self.listeners.remove(id);
    }
}
