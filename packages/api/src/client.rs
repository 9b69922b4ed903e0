//! # Backend client — one configured HTTP client per process
//!
//! [`BackendClient`] wraps a `reqwest::Client` and a [`BackendConfig`]. It is
//! built once at startup and handed to every component as
//! `Arc<BackendClient>`; nothing reaches for a global.
//!
//! Every request carries the public key in the `apikey` header and a bearer
//! token: the caller's access token when there is one, the public key
//! otherwise. Redirects are never followed, so an auth endpoint that answers
//! with a redirect surfaces as a failed request instead of a silent hop.
//!
//! ## Error bodies
//!
//! The auth API answers `{"msg": …}` or `{"error": …, "error_description": …}`;
//! the data API answers `{"message": …}`. [`error_message`] extracts the most
//! specific text from any of them, returning `None` when the body is not a
//! structured error at all.

use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use store::AuthUser;

use crate::config::BackendConfig;
use crate::error::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct BackendClient {
    config: BackendConfig,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn storage_key(&self) -> String {
        self.config.storage_key()
    }

    /// Start a request to `path`, authenticated as `access_token` or anonymously.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        access_token: Option<&str>,
    ) -> Result<RequestBuilder> {
        let url = self.config.endpoint(path)?;
        let bearer = access_token.unwrap_or(self.config.anon_key());
        Ok(self
            .http
            .request(method, url)
            .header("apikey", self.config.anon_key())
            .bearer_auth(bearer))
    }

    /// Resolve the user behind `access_token` with the auth service.
    pub async fn fetch_user(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .request(Method::GET, "auth/v1/user", Some(access_token))?
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::IdentityUnresolved);
        }
        let response = ensure_success(response, "resolve user").await?;
        Ok(response.json().await?)
    }
}

/// Pass successful responses through; turn everything else into
/// [`ApiError::BackendRequestFailed`] carrying the backend's message.
pub(crate) async fn ensure_success(response: Response, operation: &'static str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = error_message(response)
        .await
        .unwrap_or_else(|| status.to_string());
    Err(ApiError::request_failed(operation, reason))
}

/// Extract the human-readable message from a structured error body.
pub(crate) async fn error_message(response: Response) -> Option<String> {
    let body = response.text().await.ok()?;
    message_from_body(&body)
}

fn message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
