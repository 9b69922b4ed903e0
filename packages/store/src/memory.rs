use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::storage::SessionStorage;

/// In-memory SessionStorage for testing and tools.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    async fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// Storage used outside a browser-like context: reads are always absent and
/// writes are dropped, so server-side code paths never fail on it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStorage;

impl SessionStorage for NoopStorage {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: String) {}

    async fn remove(&self, _key: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_set_get_remove() {
        let storage = MemoryStorage::new();

        assert!(storage.get("token").await.is_none());

        storage.set("token", "abc".to_string()).await;
        assert_eq!(storage.get("token").await.as_deref(), Some("abc"));
        assert_eq!(storage.len(), 1);

        // Overwrite keeps a single entry
        storage.set("token", "def".to_string()).await;
        assert_eq!(storage.get("token").await.as_deref(), Some("def"));
        assert_eq!(storage.len(), 1);

        storage.remove("token").await;
        assert!(storage.get("token").await.is_none());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_memory_clones_share_entries() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        other.set("k", "v".to_string()).await;
        assert_eq!(storage.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_noop_is_always_absent() {
        let storage = NoopStorage;

        storage.set("token", "abc".to_string()).await;
        assert!(storage.get("token").await.is_none());

        // Removing a missing key is fine
        storage.remove("token").await;
        assert!(storage.get("token").await.is_none());
    }
}
