use api::ApiError;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Backend connectivity check. Always 200; the body says whether it worked.
pub async fn health_db(State(state): State<AppState>) -> Json<Value> {
    let body = match state.repository(None).ping().await {
        Ok(count) => json!({
            "success": true,
            "message": "Database connection successful!",
            "details": count,
        }),
        Err(ApiError::BackendRequestFailed { reason, .. }) => json!({
            "success": false,
            "error": reason,
            "details": "The bookmarks table might not exist. Run the database migration on the backend.",
        }),
        Err(e) => json!({
            "success": false,
            "error": "Backend unreachable or misconfigured",
            "details": e.to_string(),
        }),
    };
    Json(body)
}
