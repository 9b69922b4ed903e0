//! # Session storage — where auth tokens live between requests
//!
//! [`SessionStorage`] is a tiny string key/value contract used by the auth
//! client to persist the serialised [`Session`](crate::Session), the PKCE code
//! verifier and the OAuth `state` issued at login. Every platform plugs in its
//! own backend:
//!
//! | Implementation | Where | Behaviour |
//! |----------------|-------|-----------|
//! | [`MemoryStorage`](crate::MemoryStorage) | tests, tools | process-local map |
//! | [`NoopStorage`](crate::NoopStorage) | server-side rendering without a session | always absent, writes ignored |
//! | `BrowserStorage` | web (`wasm32` + `web` feature) | `window.localStorage`, no-op without a window |
//! | `api::auth::TowerSessionStorage` | axum server | per-request `tower_sessions::Session` |
//!
//! ## Error handling
//!
//! There are no error conditions beyond absence. Implementations swallow
//! backend failures (logging them where useful) so that a broken store degrades
//! to "signed out" instead of failing the request.

use std::future::Future;

/// Async key/value store for auth tokens.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Option<String>> + Send;

    fn set(&self, key: &str, value: String) -> impl Future<Output = ()> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = ()> + Send;
}

impl<S: SessionStorage> SessionStorage for &S {
    async fn get(&self, key: &str) -> Option<String> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) {
        (**self).remove(key).await
    }
}
