/*
 * Responsibility
 * - GET /me: echo the authenticated principal
 */
use axum::Json;

use crate::api::v1::dto::identity::MeResponse;
use crate::api::v1::extractors::SecurityCtxExtractor;

pub async fn me(SecurityCtxExtractor(ctx): SecurityCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse::from(&ctx))
}
