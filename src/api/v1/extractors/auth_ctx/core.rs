use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::SecurityCtx;

/// Extractor that hands the gate's `SecurityCtx` to a handler.
/// Assumes the gate already inserted it into request.extensions().
/// If it is missing the handler was registered without markers, which is a
/// routing bug: logged and answered with 500.
pub struct SecurityCtxExtractor(pub SecurityCtx);

impl<S> FromRequestParts<S> for SecurityCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityCtx>()
            .cloned()
            .map(SecurityCtxExtractor)
            .ok_or_else(|| {
                tracing::error!(
                    path = %parts.uri.path(),
                    "SecurityCtx missing; handler is mounted on an unprotected operation"
                );
                AppError::Internal
            })
    }
}
