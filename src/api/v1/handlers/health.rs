/*
 * Responsibility
 * - GET /health (liveness)
 * - registered without markers: the gate never runs for it
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
