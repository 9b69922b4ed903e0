use api::callback::{self, CallbackParams};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, Redirect};
use serde::Deserialize;
use tower_sessions::Session;

use crate::state::AppState;
use crate::views;

/// Start the provider sign-in. Failures are logged and land back on `/`.
pub async fn login(State(state): State<AppState>, session: Session) -> Redirect {
    let callback_url = match state.callback_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Invalid public URL {}: {}", state.settings.server.public_url, e);
            return Redirect::to("/");
        }
    };

    match state.auth_client(session).login(&callback_url).await {
        Ok(authorize_url) => Redirect::to(authorize_url.as_str()),
        Err(e) => {
            tracing::error!("Error logging in: {}", e);
            Redirect::to("/")
        }
    }
}

pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Redirect {
    tracing::info!(
        code = if params.code.is_some() { "present" } else { "missing" },
        next = ?params.next,
        "Auth callback received"
    );

    let cookies = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());
    let auth = state.auth_client(session);

    Redirect::to(&callback::handle_callback(&auth, &params, cookies).await)
}

/// Sign out. On failure the session stays and the user stays on the dashboard.
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    match state.auth_client(session).logout().await {
        Ok(()) => Redirect::to("/"),
        Err(e) => {
            tracing::error!("Error logging out: {}", e);
            Redirect::to("/dashboard")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorParams {
    error: Option<String>,
}

pub async fn auth_code_error(Query(params): Query<ErrorParams>) -> Html<String> {
    Html(views::auth_error_page(params.error.as_deref()))
}
