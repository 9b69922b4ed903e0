//! Error taxonomy shared by every backend-facing component.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no authorization code in callback")]
    NoAuthorizationCode,

    #[error("{0}")]
    SessionExchangeFailed(String),

    #[error("unexpected failure while completing sign-in")]
    UnexpectedCallbackFailure,

    #[error("OAuth state does not match the one issued at login")]
    StateMismatch,

    #[error("current user could not be resolved")]
    IdentityUnresolved,

    #[error("{operation} failed: {reason}")]
    BackendRequestFailed {
        operation: &'static str,
        reason: String,
    },

    #[error("{0} is not set; the backend cannot be reached without it")]
    ConfigurationMissing(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid bookmark: {0}")]
    InvalidBookmark(String),

    #[error("live channel: {0}")]
    Realtime(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub(crate) fn request_failed(operation: &'static str, reason: impl Into<String>) -> Self {
        ApiError::BackendRequestFailed {
            operation,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
