//! # Browser storage — `window.localStorage`
//!
//! [`BrowserStorage`] is the [`SessionStorage`] used by the **web platform**.
//! It keeps the auth tokens in `localStorage` so that a reload keeps the user
//! signed in.
//!
//! The handle is a zero-size struct that looks up `window.localStorage` on
//! every call. `web_sys::Storage` is not `Send`, and looking it up again is
//! cheap, so nothing browser-owned is held inside the struct or across an
//! `.await`.
//!
//! When there is no window (a worker, or a pre-render pass) or the storage is
//! blocked by the browser's privacy settings, every read is absent and every
//! write is dropped, exactly like [`NoopStorage`](crate::NoopStorage).

use crate::storage::SessionStorage;

/// `localStorage`-backed SessionStorage for the web platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    pub fn new() -> Self {
        Self
    }

    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

impl SessionStorage for BrowserStorage {
    async fn get(&self, key: &str) -> Option<String> {
        Self::local_storage()?.get_item(key).ok().flatten()
    }

    async fn set(&self, key: &str, value: String) {
        let Some(storage) = Self::local_storage() else {
            return;
        };
        if storage.set_item(key, &value).is_err() {
            tracing::warn!("localStorage rejected write for {}", key);
        }
    }

    async fn remove(&self, key: &str) {
        if let Some(storage) = Self::local_storage() {
            let _ = storage.remove_item(key);
        }
    }
}
