//! The item store: a read-through cache of every project item over a
//! [`Backend`].
//!
//! The backend is the source of truth. Every notification it delivers carries
//! the full set of documents, and the store replaces its cached list wholesale
//! rather than merging. Two clients editing the same item race, and the last
//! write the backend commits is the one everybody sees.

pub mod backend;
pub mod file;
pub mod memory;
pub mod record;

pub use backend::{Backend, Listener, Snapshot, StoreError, WatchId};
pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::model::item::delete_confirmation_matches;
use crate::model::{Comment, ItemDraft, ItemPatch, ProjectItem};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

type Cache = Arc<RwLock<Vec<ProjectItem>>>;

/// Project items kept in sync with a backend.
#[derive(Clone)]
pub struct ItemStore {
    backend: Arc<dyn Backend>,
    cache: Cache,
}

impl std::fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.cache.read().map_or(0, |items| items.len());
        f.debug_struct("ItemStore").field("cached", &cached).finish()
    }
}

impl ItemStore {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            cache: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register `on_change`, called with the full item list (newest first)
    /// right away and after every backend change. Each call sees a list that
    /// has already replaced the store's cache.
    ///
    /// Dropping the returned [`Subscription`] stops the notifications.
    pub fn subscribe<F>(&self, on_change: F) -> Result<Subscription, StoreError>
    where
        F: Fn(&[ProjectItem]) + Send + Sync + 'static,
    {
        let cache = Arc::clone(&self.cache);
        let listener: Listener = Arc::new(move |snapshot: &Snapshot| {
            let items = items_from_snapshot(snapshot);
            match cache.write() {
                Ok(mut cached) => cached.clone_from(&items),
                Err(_) => warn!("item cache poisoned; delivering snapshot without caching"),
            }
            on_change(&items);
        });
        let watch = self.backend.watch(listener)?;
        debug!(?watch, "subscribed to item store");
        Ok(Subscription {
            backend: Arc::clone(&self.backend),
            watch: Some(watch),
        })
    }

    /// The cached item list as of the last notification or refresh.
    #[must_use]
    pub fn items(&self) -> Vec<ProjectItem> {
        self.cache.read().map(|items| items.clone()).unwrap_or_default()
    }

    /// The cached item with `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<ProjectItem> {
        self.cache
            .read()
            .ok()
            .and_then(|items| items.iter().find(|item| item.id == id).cloned())
    }

    /// Read a fresh snapshot and replace the cache with it.
    pub fn refresh(&self) -> Result<Vec<ProjectItem>, StoreError> {
        let items = items_from_snapshot(&self.backend.snapshot()?);
        self.cache.write()?.clone_from(&items);
        Ok(items)
    }

    /// Create an item stamped with the current time.
    pub fn create(&self, draft: ItemDraft) -> Result<ProjectItem, StoreError> {
        self.create_at(draft, Utc::now())
    }

    /// Create an item with `is_done = false`, no comments and `created_at = now`.
    ///
    /// Preconditions (title, attachments) are the caller's job; see
    /// [`ItemDraft::validate`].
    pub fn create_at(
        &self,
        draft: ItemDraft,
        now: DateTime<Utc>,
    ) -> Result<ProjectItem, StoreError> {
        let id = self.backend.allocate_id()?;
        let item = ProjectItem {
            id,
            title: draft.title,
            description: draft.description,
            attachments: draft.attachments,
            is_done: false,
            comments: Vec::new(),
            created_at: now,
        };
        self.backend.put(&item.id, record::encode_new(&item)?)?;
        info!(id = %item.id, title = %item.title, "item created");
        Ok(item)
    }

    /// Merge the fields present in `patch` into the stored item.
    pub fn update(&self, id: &str, patch: &ItemPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            debug!(id, "empty patch; nothing to write");
            return Ok(());
        }
        let fields = record::into_document(serde_json::to_value(patch)?)?;
        self.backend.merge(id, fields)?;
        debug!(id, "item updated");
        Ok(())
    }

    pub fn set_done(&self, id: &str, is_done: bool) -> Result<(), StoreError> {
        self.update(id, &ItemPatch::done(is_done))
    }

    /// Replace the whole comment forest of an item.
    pub fn replace_comments(&self, id: &str, comments: Vec<Comment>) -> Result<(), StoreError> {
        self.update(id, &ItemPatch::comments(comments))
    }

    /// Run a comment-tree transform against `item`'s forest and persist the result.
    pub fn edit_comments(
        &self,
        item: &ProjectItem,
        transform: impl FnOnce(Vec<Comment>) -> Vec<Comment>,
    ) -> Result<Vec<Comment>, StoreError> {
        let comments = transform(item.comments.clone());
        self.replace_comments(&item.id, comments.clone())?;
        Ok(comments)
    }

    /// Remove an item outright.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.backend.remove(id)?;
        info!(id, "item deleted");
        Ok(())
    }

    /// Delete `item` only if `typed` repeats its title exactly.
    ///
    /// Returns `Ok(false)` without touching the backend on a mismatch.
    pub fn delete_confirmed(&self, item: &ProjectItem, typed: &str) -> Result<bool, StoreError> {
        if !delete_confirmation_matches(&item.title, typed) {
            debug!(id = %item.id, "delete confirmation does not match title");
            return Ok(false);
        }
        self.delete(&item.id)?;
        Ok(true)
    }
}

/// Decode every document, newest first. Undecodable documents are skipped.
#[must_use]
pub fn items_from_snapshot(snapshot: &Snapshot) -> Vec<ProjectItem> {
    let mut items: Vec<ProjectItem> = snapshot
        .iter()
        .filter_map(|(id, doc)| match record::decode(id, doc) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(id, error = %err, "skipping undecodable item record");
                None
            }
        })
        .collect();
    items.sort_by(|a, b| {
        Reverse(a.created_at)
            .cmp(&Reverse(b.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
    items
}

/// Live registration with the backend; unregisters on drop.
pub struct Subscription {
    backend: Arc<dyn Backend>,
    watch: Option<WatchId>,
}

impl Subscription {
    /// Stop receiving notifications. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(watch) = self.watch.take() {
            self.backend.unwatch(watch);
            debug!(?watch, "unsubscribed from item store");
        }
    }

    /// Whether this subscription is still registered.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.watch.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("watch", &self.watch)
            .finish_non_exhaustive()
    }
}
