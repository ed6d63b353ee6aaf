use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::routes::AppState;

/// GET /health - Liveness check
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// GET /ready - Readiness check, reports mounted views
pub async fn ready(State(app): State<AppState>) -> impl IntoResponse {
    let views = app.views.len().await;

    (StatusCode::OK, Json(json!({"status": "ready", "views": views})))
}
