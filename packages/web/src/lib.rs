//! # Web crate — the bookmark manager's axum server
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`settings`] | Layered server settings (`config.toml`, `BOOKMARKS__*` variables) |
//! | [`logger`] | `tracing-subscriber` setup |
//! | [`state`] | [`AppState`](state::AppState): the shared backend client, guard and settings |
//! | [`guard`] | Route-guard middleware |
//! | [`routes`] | Handlers for pages, the OAuth flow, bookmark actions, live events and health |
//! | [`views`] | Dioxus page components, rendered to HTML with `dioxus-ssr` |
//!
//! Sessions live in a tower-sessions store keyed by an opaque cookie; the
//! backend tokens never reach the browser.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

pub mod guard;
pub mod logger;
pub mod routes;
pub mod settings;
pub mod state;
pub mod views;

use routes::{auth, bookmarks, health, pages};
use settings::Settings;
use state::AppState;

fn session_layer(settings: &Settings) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(settings.auth.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(settings.auth.session_days)))
}

/// All routes, with the guard inside the session layer.
pub fn router(state: AppState) -> Router {
    let sessions = session_layer(&state.settings);

    Router::new()
        .route("/", get(pages::landing))
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/bookmarks", post(bookmarks::create))
        .route("/dashboard/bookmarks/{id}/delete", post(bookmarks::delete))
        .route("/dashboard/events", get(bookmarks::events))
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/auth-code-error", get(auth::auth_code_error))
        .route("/health/db", get(health::health_db))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::route_guard,
        ))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
