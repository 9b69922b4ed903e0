//! # OAuth callback handling
//!
//! The provider sends the browser back to the callback endpoint with a `code`
//! (plus the `state` issued at login and an optional `next` path). Handling is
//! a single pass that always ends in exactly one redirect:
//!
//! | Outcome | Redirect |
//! |---------|----------|
//! | no `code` | `/auth/auth-code-error?error=no_code` |
//! | stored `state` differs or is missing | `/auth/auth-code-error?error=invalid_state` |
//! | the service rejects the code | `/auth/auth-code-error?error=<service message>` |
//! | transport, decoding or anything else | `/auth/auth-code-error?error=unexpected` |
//! | session established | `next`, or `/dashboard` |
//!
//! The state check only applies when the login step stored a state value in
//! the same session. Sign-ins started elsewhere (no stored state) go straight
//! to the exchange.

use serde::Deserialize;
use store::SessionStorage;
use url::{form_urlencoded, Url};

use crate::auth::AuthClient;
use crate::error::ApiError;

/// Where a successful sign-in lands when `next` is absent or unusable.
pub const DEFAULT_NEXT: &str = "/dashboard";
/// The unified sign-in error page.
pub const ERROR_PATH: &str = "/auth/auth-code-error";

/// Query parameters of the callback request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub next: Option<String>,
}

/// Keep `next` on this site: a local absolute path, otherwise [`DEFAULT_NEXT`].
pub fn sanitize_next(next: Option<&str>) -> String {
    next.filter(|path| is_local_path(path))
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_NEXT.to_string())
}

fn is_local_path(path: &str) -> bool {
    if !path.starts_with('/') || path.starts_with("//") || path.contains('\\') {
        return false;
    }
    // Browsers drop tabs and newlines while parsing `Location`
    if path.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return false;
    }

    let Ok(origin) = Url::parse("http://localhost") else {
        return false;
    };
    origin
        .join(path)
        .is_ok_and(|resolved| resolved.origin() == origin.origin())
}

/// Run the callback and return the path to continue to, or why it failed.
///
/// Errors are limited to the callback taxonomy: [`ApiError::NoAuthorizationCode`],
/// [`ApiError::StateMismatch`], [`ApiError::SessionExchangeFailed`] and
/// [`ApiError::UnexpectedCallbackFailure`].
pub async fn run_callback<S: SessionStorage>(
    auth: &AuthClient<S>,
    params: &CallbackParams,
    cookies: Option<&str>,
) -> Result<String, ApiError> {
    let next = sanitize_next(params.next.as_deref());

    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        tracing::info!("Auth callback without a code");
        return Err(ApiError::NoAuthorizationCode);
    };

    if let Some(issued) = auth.issued_state().await {
        if params.state.as_deref() != Some(issued.as_str()) {
            tracing::warn!("Auth callback state does not match the issued state");
            return Err(ApiError::StateMismatch);
        }
    }

    match auth.exchange_code(code, cookies).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "Session created");
            Ok(next)
        }
        Err(ApiError::SessionExchangeFailed(message)) => {
            tracing::warn!("Session exchange failed: {}", message);
            Err(ApiError::SessionExchangeFailed(message))
        }
        Err(e) => {
            tracing::error!("Unexpected error in auth callback: {}", e);
            Err(ApiError::UnexpectedCallbackFailure)
        }
    }
}

/// Redirect target for a finished callback.
pub fn redirect_location(outcome: &Result<String, ApiError>) -> String {
    let error = match outcome {
        Ok(next) => return next.clone(),
        Err(ApiError::NoAuthorizationCode) => "no_code".to_string(),
        Err(ApiError::StateMismatch) => "invalid_state".to_string(),
        Err(ApiError::SessionExchangeFailed(message)) => message.clone(),
        Err(_) => "unexpected".to_string(),
    };
    error_location(&error)
}

/// `/auth/auth-code-error?error=<error>`, with `error` URL-encoded.
pub fn error_location(error: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("error", error)
        .finish();
    format!("{ERROR_PATH}?{query}")
}

/// Run the callback and return the single redirect location.
pub async fn handle_callback<S: SessionStorage>(
    auth: &AuthClient<S>,
    params: &CallbackParams,
    cookies: Option<&str>,
) -> String {
    redirect_location(&run_callback(auth, params, cookies).await)
}
