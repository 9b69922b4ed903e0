//! # Domain models for bookmarks and live changes
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`Bookmark`] | One row of the `bookmarks` collection: server-generated `id` and `created_at`, the owning `user_id`, and the user-supplied `title` and `url`. |
//! | [`LiveChange`] | A change pushed over the live channel: an inserted row or the id of a deleted one. |
//!
//! Bookmarks are never updated in place. Visibility is restricted to the owner
//! by the backend's row-level policy; nothing here re-checks ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved bookmark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// A row-level change delivered by the live channel.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveChange {
    Insert(Bookmark),
    Delete { id: String },
}

impl LiveChange {
    /// Id of the affected bookmark.
    pub fn id(&self) -> &str {
        match self {
            LiveChange::Insert(bookmark) => &bookmark.id,
            LiveChange::Delete { id } => id,
        }
    }
}
