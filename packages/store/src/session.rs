//! # Auth session — tokens, identity, and their stored form
//!
//! A [`Session`] is what the auth service hands back after a successful code
//! exchange or token refresh: an access token, a refresh token, expiry data and
//! the signed-in [`AuthUser`]. Unknown fields in the service's JSON are ignored.
//!
//! ## Stored form
//!
//! The browser and the server must read each other's writes, so there is one
//! encoding, produced by [`Session::encode`]:
//!
//! ```text
//! base64-<base64url(JSON)>
//! ```
//!
//! [`Session::decode`] accepts that form and plain JSON. Anything else decodes
//! to `None` and is treated as "no session".
//!
//! ## Storage keys
//!
//! All values for one backend project share a prefix (the *storage key*,
//! `sb-<project-ref>-auth-token`). [`code_verifier_key`] and [`oauth_state_key`]
//! derive the keys for the short-lived PKCE verifier and CSRF state.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::storage::SessionStorage;

/// Seconds before `expires_at` at which a session already counts as expired.
pub const EXPIRY_MARGIN_SECS: i64 = 10;

const BASE64_PREFIX: &str = "base64-";

/// The signed-in user as reported by the auth service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token set plus identity for one signed-in user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds, as issued.
    #[serde(default)]
    pub expires_in: i64,
    /// Absolute expiry as a unix timestamp.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Fill in `expires_at` from `expires_in` when the service omitted it.
    pub fn with_expiry_from(mut self, now: i64) -> Self {
        if self.expires_at.is_none() && self.expires_in > 0 {
            self.expires_at = Some(now + self.expires_in);
        }
        self
    }

    /// Whether the access token is expired (or about to be) at `now`.
    /// Sessions without expiry information never expire locally.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(at) => at - EXPIRY_MARGIN_SECS <= now,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    /// Encode to the shared stored form.
    pub fn encode(&self) -> String {
        // Serialising plain strings and integers cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a stored value written by [`Session::encode`] or as raw JSON.
    pub fn decode(value: &str) -> Option<Self> {
        match value.strip_prefix(BASE64_PREFIX) {
            Some(encoded) => {
                let bytes = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?;
                serde_json::from_slice(&bytes).ok()
            }
            None => serde_json::from_str(value).ok(),
        }
    }
}

/// Key holding the PKCE verifier between login and callback.
pub fn code_verifier_key(storage_key: &str) -> String {
    format!("{storage_key}-code-verifier")
}

/// Key holding the CSRF state issued at login.
pub fn oauth_state_key(storage_key: &str) -> String {
    format!("{storage_key}-oauth-state")
}

/// Read the session stored under `storage_key`, if any.
pub async fn load_session<S: SessionStorage>(storage: &S, storage_key: &str) -> Option<Session> {
    let raw = storage.get(storage_key).await?;
    let session = Session::decode(&raw);
    if session.is_none() {
        tracing::warn!("Discarding unreadable session under {}", storage_key);
    }
    session
}

pub async fn save_session<S: SessionStorage>(storage: &S, storage_key: &str, session: &Session) {
    storage.set(storage_key, session.encode()).await;
}

pub async fn clear_session<S: SessionStorage>(storage: &S, storage_key: &str) {
    storage.remove(storage_key).await;
}
