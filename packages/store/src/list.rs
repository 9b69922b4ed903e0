//! # Newest-first bookmark list with idempotent merging
//!
//! Both the direct mutation call (create/delete) and the live channel's echo
//! of the same change update the local list, in either order. [`BookmarkList`]
//! makes every update idempotent by keying on the bookmark id:
//!
//! - [`insert`](BookmarkList::insert) prepends only when the id is absent.
//! - [`remove`](BookmarkList::remove) drops the id, and is a no-op when it is
//!   already gone.
//!
//! Applying the same [`LiveChange`] twice therefore yields the same list as
//! applying it once.

use serde::Serialize;

use crate::models::{Bookmark, LiveChange};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BookmarkList {
    items: Vec<Bookmark>,
}

impl BookmarkList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a freshly fetched listing (already ordered
    /// newest-first). Duplicate ids keep their first occurrence.
    pub fn replace_all(&mut self, bookmarks: Vec<Bookmark>) {
        self.items.clear();
        for bookmark in bookmarks {
            if !self.contains(&bookmark.id) {
                self.items.push(bookmark);
            }
        }
    }

    /// Prepend `bookmark` unless a bookmark with the same id is present.
    /// Returns whether the list changed.
    pub fn insert(&mut self, bookmark: Bookmark) -> bool {
        if self.contains(&bookmark.id) {
            return false;
        }
        self.items.insert(0, bookmark);
        true
    }

    /// Remove the bookmark with `id`. Returns whether the list changed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|b| b.id != id);
        self.items.len() != before
    }

    pub fn apply(&mut self, change: &LiveChange) -> bool {
        match change {
            LiveChange::Insert(bookmark) => self.insert(bookmark.clone()),
            LiveChange::Delete { id } => self.remove(id),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|b| b.id == id)
    }

    pub fn as_slice(&self) -> &[Bookmark] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Bookmark> {
        self.items
    }
}

impl From<Vec<Bookmark>> for BookmarkList {
    fn from(bookmarks: Vec<Bookmark>) -> Self {
        let mut list = Self::new();
        list.replace_all(bookmarks);
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bookmark(id: &str, title: &str, url: &str) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            title: title.to_string(),
            url: url.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_insert_prepends_newest_first() {
        let mut list = BookmarkList::new();
        assert!(list.insert(bookmark("1", "A", "https://a.com")));
        assert!(list.insert(bookmark("2", "B", "https://b.com")));

        let ids: Vec<_> = list.as_slice().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_insert_same_event_twice_is_idempotent() {
        let event = LiveChange::Insert(bookmark("1", "A", "https://a.com"));

        let mut once = BookmarkList::new();
        once.apply(&event);

        let mut twice = BookmarkList::new();
        assert!(twice.apply(&event));
        assert!(!twice.apply(&event));

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
        assert_eq!(twice.as_slice()[0].id, "1");
    }

    #[test]
    fn test_delete_missing_id_is_noop() {
        let mut list = BookmarkList::from(vec![bookmark("1", "A", "https://a.com")]);
        let before = list.clone();

        assert!(!list.apply(&LiveChange::Delete { id: "nope".to_string() }));
        assert_eq!(list, before);
    }

    #[test]
    fn test_delete_twice_is_idempotent() {
        let mut list = BookmarkList::from(vec![
            bookmark("2", "B", "https://b.com"),
            bookmark("1", "A", "https://a.com"),
        ]);
        let event = LiveChange::Delete { id: "2".to_string() };

        assert!(list.apply(&event));
        assert!(!list.apply(&event));
        assert_eq!(list.len(), 1);
        assert!(!list.contains("2"));
    }

    #[test]
    fn test_direct_insert_then_echo() {
        // The create call returns the row, then the live channel echoes it
        let created = bookmark("7", "Example", "https://example.com");
        let mut list = BookmarkList::new();

        list.insert(created.clone());
        list.apply(&LiveChange::Insert(created));

        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_replace_all_drops_duplicate_ids() {
        let mut list = BookmarkList::new();
        list.replace_all(vec![
            bookmark("1", "A", "https://a.com"),
            bookmark("1", "A again", "https://a.com"),
            bookmark("2", "B", "https://b.com"),
        ]);

        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[0].title, "A");
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let list = BookmarkList::from(vec![bookmark("1", "A", "https://a.com")]);
        let json = serde_json::to_value(&list).unwrap();

        assert!(json.is_array());
        assert_eq!(json[0]["id"], "1");
    }
}
