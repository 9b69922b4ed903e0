//! Server-side session storage backed by tower-sessions.

use store::SessionStorage;
use tower_sessions::Session;

/// [`SessionStorage`] over the request's `tower_sessions::Session`.
///
/// Tokens stay in the server-side session store; the browser only holds the
/// opaque session-id cookie the session layer sets on the response.
#[derive(Clone, Debug)]
pub struct TowerSessionStorage {
    session: Session,
}

impl TowerSessionStorage {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl SessionStorage for TowerSessionStorage {
    async fn get(&self, key: &str) -> Option<String> {
        match self.session.get::<String>(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {} from session: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String) {
        if let Err(e) = self.session.insert(key, value).await {
            tracing::warn!("Failed to write {} to session: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(e) = self.session.remove::<String>(key).await {
            tracing::warn!("Failed to remove {} from session: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn test_roundtrip_through_tower_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let storage = TowerSessionStorage::new(session);

        assert!(storage.get("sb-x-auth-token").await.is_none());

        storage.set("sb-x-auth-token", "value".to_string()).await;
        assert_eq!(storage.get("sb-x-auth-token").await.as_deref(), Some("value"));

        storage.remove("sb-x-auth-token").await;
        assert!(storage.get("sb-x-auth-token").await.is_none());
    }
}
