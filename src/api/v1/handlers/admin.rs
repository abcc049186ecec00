/*
 * Responsibility
 * - handlers under /admin (resource is restricted to the admin role)
 * - read-only view of the identity store
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::v1::dto::identity::UserResponse;
use crate::api::v1::extractors::SecurityCtxExtractor;
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_user(
    State(state): State<AppState>,
    SecurityCtxExtractor(ctx): SecurityCtxExtractor,
    Path(subject): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    tracing::info!(admin = %ctx.principal().name(), subject = %subject, "identity lookup");

    let record = state
        .identity
        .lookup(&subject)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(UserResponse::new(subject, record)))
}

// Registered as deny-all: kept so the operation exists and answers 403 instead of 404.
pub async fn revoke_sessions() -> StatusCode {
    StatusCode::NO_CONTENT
}
