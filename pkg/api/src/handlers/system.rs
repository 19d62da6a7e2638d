use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// GET /api/v1/ping: unauthenticated liveness probe.
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "message": "pong" })))
}
