use api::GuardDecision;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;

use crate::state::AppState;

/// Apply the route guard to landing and protected paths.
///
/// A session check that errors lets the request through; the handler behind
/// it decides what an unresolved session means.
pub async fn route_guard(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !state.guard.matches(&path) {
        return next.run(request).await;
    }

    let check = state
        .auth_client(session)
        .current_session()
        .await
        .map(|session| session.is_some());

    match state.guard.decide_checked(&path, check) {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::Redirect(to) => {
            tracing::debug!("Guard redirects {} to {}", path, to);
            Redirect::to(&to).into_response()
        }
    }
}
