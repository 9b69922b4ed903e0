use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use store::BookmarkList;
use tower_sessions::Session;

use crate::state::AppState;
use crate::views;

pub async fn landing() -> Html<String> {
    Html(views::home_page())
}

pub async fn dashboard(State(state): State<AppState>, session: Session) -> Response {
    let current = match state.auth_client(session).current_session().await {
        Ok(Some(current)) => current,
        Ok(None) => return Redirect::to("/").into_response(),
        Err(e) => {
            tracing::warn!("Could not resolve session for dashboard: {}", e);
            return Redirect::to("/").into_response();
        }
    };

    let mut bookmarks = BookmarkList::new();
    match state.repository(Some(&current)).list().await {
        Ok(rows) => bookmarks.replace_all(rows),
        Err(e) => tracing::error!("Error fetching bookmarks: {}", e),
    }

    Html(views::dashboard_page(current.user.email.as_deref(), &bookmarks)).into_response()
}
