//! # Auth client — OAuth PKCE sign-in, code exchange, sign-out
//!
//! [`AuthClient`] drives the hosted auth service on behalf of one caller. It is
//! generic over the [`SessionStorage`] that holds that caller's tokens, so the
//! same flow runs against a tower-sessions session on the server, browser
//! storage on the web, or [`store::MemoryStorage`] in tests.
//!
//! ## Flow
//!
//! 1. **[`login`](AuthClient::login)** generates a PKCE S256 challenge and a
//!    random CSRF `state`, stores the verifier and state, and returns the
//!    provider authorize URL. The caller navigates there.
//! 2. The provider sends the browser back to the callback endpoint with a
//!    `code`. **[`exchange_code`](AuthClient::exchange_code)** trades it (plus
//!    the stored verifier) for a [`Session`], forwarding the incoming request's
//!    cookies, and stores the session.
//! 3. **[`current_session`](AuthClient::current_session)** reads it back on
//!    later requests, refreshing it once the access token expires.
//! 4. **[`logout`](AuthClient::logout)** revokes the session with the service
//!    and clears local state. A failed revoke keeps the session.

use std::sync::Arc;

use oauth2::{CsrfToken, PkceCodeChallenge};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use store::session::{clear_session, code_verifier_key, load_session, oauth_state_key, save_session};
use store::{AuthUser, Session, SessionStorage};
use url::Url;

use crate::client::{ensure_success, error_message, BackendClient};
use crate::error::{ApiError, Result};

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "google";

#[derive(Serialize)]
struct PkceGrant<'a> {
    auth_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_verifier: Option<&'a str>,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Auth operations for one caller, persisting tokens in `S`.
pub struct AuthClient<S> {
    backend: Arc<BackendClient>,
    storage: S,
    provider: String,
}

impl<S: SessionStorage> AuthClient<S> {
    pub fn new(backend: Arc<BackendClient>, storage: S) -> Self {
        Self {
            backend,
            storage,
            provider: DEFAULT_PROVIDER.to_string(),
        }
    }

    /// Use another OAuth provider (e.g. `"github"`).
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn backend(&self) -> &Arc<BackendClient> {
        &self.backend
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn storage_key(&self) -> String {
        self.backend.storage_key()
    }

    /// Begin the provider sign-in. Returns the URL to send the browser to;
    /// the provider will come back to `redirect_to` with a `code`.
    pub async fn login(&self, redirect_to: &Url) -> Result<Url> {
        let key = self.storage_key();

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let csrf_state = CsrfToken::new_random();

        let mut callback = redirect_to.clone();
        callback
            .query_pairs_mut()
            .append_pair("state", csrf_state.secret());

        let mut authorize = self.backend.config().endpoint("auth/v1/authorize")?;
        authorize
            .query_pairs_mut()
            .append_pair("provider", &self.provider)
            .append_pair("redirect_to", callback.as_str())
            .append_pair("code_challenge", pkce_challenge.as_str())
            .append_pair("code_challenge_method", "s256");

        self.storage
            .set(&code_verifier_key(&key), pkce_verifier.secret().clone())
            .await;
        self.storage
            .set(&oauth_state_key(&key), csrf_state.secret().clone())
            .await;

        tracing::debug!(provider = %self.provider, "Starting OAuth sign-in");
        Ok(authorize)
    }

    /// The CSRF state stored by [`login`](Self::login), if a sign-in is pending.
    pub async fn issued_state(&self) -> Option<String> {
        self.storage.get(&oauth_state_key(&self.storage_key())).await
    }

    /// Trade an authorization code for a session and store it.
    ///
    /// `cookies` is the raw `Cookie` header of the incoming request; it is
    /// forwarded unchanged. A structured rejection from the service becomes
    /// [`ApiError::SessionExchangeFailed`]; transport and decoding problems
    /// keep their own variants.
    pub async fn exchange_code(&self, code: &str, cookies: Option<&str>) -> Result<Session> {
        let key = self.storage_key();
        let verifier = self.storage.get(&code_verifier_key(&key)).await;

        let mut request = self
            .backend
            .request(Method::POST, "auth/v1/token", None)?
            .query(&[("grant_type", "pkce")])
            .json(&PkceGrant {
                auth_code: code,
                code_verifier: verifier.as_deref(),
            });
        if let Some(cookies) = cookies {
            request = request.header(reqwest::header::COOKIE, cookies);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(match error_message(response).await {
                Some(message) => ApiError::SessionExchangeFailed(message),
                None => ApiError::request_failed("exchange code", status.to_string()),
            });
        }

        let session: Session = response.json().await?;
        let session = session.with_expiry_from(chrono::Utc::now().timestamp());

        save_session(&self.storage, &key, &session).await;
        self.storage.remove(&code_verifier_key(&key)).await;
        self.storage.remove(&oauth_state_key(&key)).await;

        Ok(session)
    }

    /// The stored session, refreshed if its access token has expired.
    ///
    /// A refresh the service rejects clears the session and yields `None`;
    /// transport failures are returned so callers can decide how to degrade.
    pub async fn current_session(&self) -> Result<Option<Session>> {
        let key = self.storage_key();
        let Some(session) = load_session(&self.storage, &key).await else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }

        match self.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                save_session(&self.storage, &key, &fresh).await;
                Ok(Some(fresh))
            }
            Err(ApiError::BackendRequestFailed { reason, .. }) => {
                tracing::info!("Session refresh rejected, signing out: {}", reason);
                clear_session(&self.storage, &key).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let response = self
            .backend
            .request(Method::POST, "auth/v1/token", None)?
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;
        let response = ensure_success(response, "refresh session").await?;

        let session: Session = response.json().await?;
        Ok(session.with_expiry_from(chrono::Utc::now().timestamp()))
    }

    /// Server-verified identity for the stored session.
    pub async fn get_user(&self) -> Result<AuthUser> {
        let session = self
            .current_session()
            .await?
            .ok_or(ApiError::IdentityUnresolved)?;
        self.backend.fetch_user(&session.access_token).await
    }

    /// Revoke the session with the service, then forget it locally.
    pub async fn logout(&self) -> Result<()> {
        let key = self.storage_key();

        if let Some(session) = load_session(&self.storage, &key).await {
            let response = self
                .backend
                .request(Method::POST, "auth/v1/logout", Some(&session.access_token))?
                .send()
                .await?;

            // A token the service no longer knows is already signed out
            let status = response.status();
            if status != StatusCode::UNAUTHORIZED && status != StatusCode::NOT_FOUND {
                ensure_success(response, "sign out").await?;
            }
        }

        clear_session(&self.storage, &key).await;
        Ok(())
    }
}
