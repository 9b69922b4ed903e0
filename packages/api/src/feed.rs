//! # Bookmark feed — a mounted, live-updating bookmark list
//!
//! A [`BookmarkFeed`] is the state behind one open list view. Mounting it
//! fetches the current bookmarks and opens exactly one live subscription; the
//! feed owns that subscription and releases it when unmounted or dropped, so
//! every exit path closes the channel.
//!
//! Two sources update the list:
//!
//! - **Live changes** are applied unconditionally as they arrive.
//! - **Direct results** of [`create`](BookmarkFeed::create) and
//!   [`delete`](BookmarkFeed::delete) are applied only while the feed is still
//!   mounted, so a request that finishes after the view went away leaves no
//!   trace.
//!
//! Both go through [`BookmarkList`]'s id-keyed merge, so the live echo of a
//! change this feed made itself is a no-op. Every change publishes a fresh
//! snapshot on a `watch` channel.
//!
//! The live channel can end on its own (server close, expired token, network
//! error). [`is_live`](BookmarkFeed::is_live) turns false and
//! [`closed`](BookmarkFeed::closed) resolves, so the owner can drop the feed
//! and mount a fresh one.
//!
//! Failures are logged and leave the list as it was.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use store::{Bookmark, BookmarkList};
use tokio::sync::watch;

use crate::bookmarks::BookmarkRepository;
use crate::realtime::{ChangeHandler, Subscription};

struct FeedState {
    list: Mutex<BookmarkList>,
    mounted: AtomicBool,
    live: watch::Sender<bool>,
    updates: watch::Sender<BookmarkList>,
}

impl FeedState {
    fn list(&self) -> MutexGuard<'_, BookmarkList> {
        self.list.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `change` on the list and publish a snapshot if it changed anything.
    fn update(&self, change: impl FnOnce(&mut BookmarkList) -> bool) {
        let snapshot = {
            let mut list = self.list();
            if !change(&mut list) {
                return;
            }
            list.clone()
        };
        self.updates.send_replace(snapshot);
    }
}

struct FeedHandler {
    state: Arc<FeedState>,
}

impl ChangeHandler for FeedHandler {
    fn on_insert(&self, bookmark: Bookmark) {
        tracing::debug!(id = %bookmark.id, "Live insert");
        self.state.update(|list| list.insert(bookmark));
    }

    fn on_delete(&self, id: String) {
        tracing::debug!(id = %id, "Live delete");
        self.state.update(|list| list.remove(&id));
    }

    fn on_close(&self) {
        if self.state.live.send_replace(false) {
            tracing::info!("Live updates stopped");
        }
    }
}

pub struct BookmarkFeed {
    repository: BookmarkRepository,
    state: Arc<FeedState>,
    subscription: Mutex<Option<Subscription>>,
}

impl BookmarkFeed {
    /// Load the list and open the live channel. Never fails: a failed load
    /// leaves the list empty and a failed subscribe leaves the feed static.
    pub async fn mount(repository: BookmarkRepository) -> Self {
        let (updates, _) = watch::channel(BookmarkList::new());
        let (live, _) = watch::channel(false);
        let state = Arc::new(FeedState {
            list: Mutex::new(BookmarkList::new()),
            mounted: AtomicBool::new(true),
            live,
            updates,
        });

        match repository.list().await {
            Ok(bookmarks) => state.update(|list| {
                list.replace_all(bookmarks);
                true
            }),
            Err(e) => tracing::error!("Error fetching bookmarks: {}", e),
        }

        let handler = FeedHandler {
            state: state.clone(),
        };
        // Live before the task starts, so an immediate close is not lost
        state.live.send_replace(true);
        let subscription = match repository.subscribe_to_changes(handler).await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!("Live updates unavailable: {}", e);
                state.live.send_replace(false);
                None
            }
        };

        Self {
            repository,
            state,
            subscription: Mutex::new(subscription),
        }
    }

    fn subscription(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_mounted(&self) -> bool {
        self.state.mounted.load(Ordering::SeqCst)
    }

    /// Whether the live channel is open.
    pub fn is_live(&self) -> bool {
        *self.state.live.borrow()
    }

    /// Resolves once the live channel is closed, or at once if it never opened.
    pub async fn closed(&self) {
        let mut live = self.state.live.subscribe();
        let _ = live.wait_for(|live| !live).await;
    }

    pub fn snapshot(&self) -> BookmarkList {
        self.state.list().clone()
    }

    /// Receive a snapshot after every change.
    pub fn watch(&self) -> watch::Receiver<BookmarkList> {
        self.state.updates.subscribe()
    }

    /// Create a bookmark and show it. Returns the created row, or `None`
    /// when the request failed (logged).
    pub async fn create(&self, title: &str, url: &str) -> Option<Bookmark> {
        match self.repository.create(title, url).await {
            Ok(bookmark) => {
                if self.is_mounted() {
                    let shown = bookmark.clone();
                    self.state.update(|list| list.insert(shown));
                }
                Some(bookmark)
            }
            Err(e) => {
                tracing::error!("Error adding bookmark: {}", e);
                None
            }
        }
    }

    /// Delete a bookmark and hide it. Returns whether the request succeeded.
    pub async fn delete(&self, id: &str) -> bool {
        match self.repository.delete(id).await {
            Ok(()) => {
                if self.is_mounted() {
                    self.state.update(|list| list.remove(id));
                }
                true
            }
            Err(e) => {
                tracing::error!("Error deleting bookmark: {}", e);
                false
            }
        }
    }

    /// Stop applying direct results and close the live channel.
    pub async fn unmount(&self) {
        self.state.mounted.store(false, Ordering::SeqCst);
        let subscription = self.subscription().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe().await;
        }
        self.state.live.send_replace(false);
    }
}

impl Drop for BookmarkFeed {
    fn drop(&mut self) {
        self.state.mounted.store(false, Ordering::SeqCst);
        // Dropping the handle signals the channel task to leave
        self.subscription().take();
    }
}
