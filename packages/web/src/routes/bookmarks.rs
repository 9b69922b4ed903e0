use std::convert::Infallible;
use std::time::Duration;

use api::BookmarkFeed;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use futures::stream::{self, Stream};
use serde::Deserialize;
use store::BookmarkList;
use tokio::sync::watch;
use tower_sessions::Session;

use crate::state::AppState;
use crate::views;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct NewBookmarkForm {
    pub title: String,
    pub url: String,
}

/// Form action behind "Add Bookmark". Failures are logged; either way the
/// browser goes back to the dashboard.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<NewBookmarkForm>,
) -> Redirect {
    let current = match state.auth_client(session).current_session().await {
        Ok(current) => current,
        Err(e) => {
            tracing::error!("Error adding bookmark: {}", e);
            return Redirect::to("/dashboard");
        }
    };

    match state
        .repository(current.as_ref())
        .create(&form.title, &form.url)
        .await
    {
        Ok(bookmark) => tracing::info!(id = %bookmark.id, "Bookmark added"),
        Err(e) => tracing::error!("Error adding bookmark: {}", e),
    }
    Redirect::to("/dashboard")
}

pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Redirect {
    let current = match state.auth_client(session).current_session().await {
        Ok(current) => current,
        Err(e) => {
            tracing::error!("Error deleting bookmark: {}", e);
            return Redirect::to("/dashboard");
        }
    };

    if let Err(e) = state.repository(current.as_ref()).delete(&id).await {
        tracing::error!("Error deleting bookmark {}: {}", id, e);
    }
    Redirect::to("/dashboard")
}

/// Live list for the dashboard as server-sent events.
///
/// Each connection mounts its own [`BookmarkFeed`] and streams a `bookmarks`
/// event carrying the rendered list items, first on connect and then after
/// every change. The stream owns the feed; a client disconnect drops both and
/// closes the live channel. When the live channel ends on its own the stream
/// ends too, and the browser reconnects after [`RECONNECT_DELAY`] with a
/// freshly resolved session.
pub async fn events(State(state): State<AppState>, session: Session) -> Response {
    let current = match state.auth_client(session).current_session().await {
        Ok(Some(current)) => current,
        Ok(None) => return StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => {
            tracing::warn!("Could not resolve session for live feed: {}", e);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    let feed = BookmarkFeed::mount(state.repository(Some(&current))).await;
    Sse::new(snapshots(feed))
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn bookmarks_event(list: &BookmarkList) -> Event {
    // Data lines cannot carry a bare carriage return
    let items = views::bookmark_items(list).replace('\r', "&#13;");
    Event::default()
        .event("bookmarks")
        .retry(RECONNECT_DELAY)
        .data(items)
}

fn snapshots(feed: BookmarkFeed) -> impl Stream<Item = Result<Event, Infallible>> {
    let updates = feed.watch();
    let first = feed.snapshot();

    stream::unfold(
        (feed, updates, Some(first)),
        |(feed, mut updates, pending): (BookmarkFeed, watch::Receiver<BookmarkList>, Option<BookmarkList>)| async move {
            let list = match pending {
                Some(list) => list,
                None => {
                    tokio::select! {
                        changed = updates.changed() => changed.ok()?,
                        _ = feed.closed() => {
                            tracing::info!("Live feed closed, ending event stream");
                            return None;
                        }
                    }
                    let list = updates.borrow_and_update().clone();
                    list
                }
            };

            Some((Ok(bookmarks_event(&list)), (feed, updates, None)))
        },
    )
}
