//! Bearer token gate → `SecurityCtx` in request extensions.
//!
//! The middleware is attached per operation (see `Resource`), so it always
//! knows the operation's `RouteInfo` without any lookup at request time.

use axum::{
    extract::{Request, State},
    http::{HeaderName, Uri},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::services::auth::{AuthGate, GateOutcome, RouteInfo, authorize};

const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Gate bound to one registered operation.
#[derive(Clone)]
pub struct GuardedRoute {
    gate: AuthGate,
    route: Arc<RouteInfo>,
    trust_forwarded_proto: bool,
}

/// Attach the gate for `route` to `method_router`.
///
/// `route_layer` keeps unmatched methods answering 405 without running the gate.
pub fn guard<S>(method_router: MethodRouter<S>, gate: AuthGate, route: RouteInfo) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let guarded = GuardedRoute {
        trust_forwarded_proto: gate.trusts_forwarded_proto(),
        gate,
        route: Arc::new(route),
    };
    method_router.route_layer(middleware::from_fn_with_state(guarded, access_middleware))
}

async fn access_middleware(
    State(guarded): State<GuardedRoute>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let secure = is_secure_transport(req.uri(), req.headers(), guarded.trust_forwarded_proto);

    let outcome = guarded
        .gate
        .authenticate(&guarded.route, req.headers(), secure)
        .await;

    let ctx = match outcome {
        Ok(GateOutcome::Unprotected) => {
            tracing::debug!(path = %req.uri().path(), "unprotected operation, passing through");
            return Ok(next.run(req).await);
        }
        Ok(GateOutcome::Authenticated(ctx)) => ctx,
        Err(err) => {
            tracing::warn!(
                error = ?err,
                status = err.status().as_u16(),
                path = %req.uri().path(),
                "request rejected by authentication gate"
            );
            return Err(err.into());
        }
    };

    if let Err(err) = authorize(&guarded.route, &ctx) {
        tracing::warn!(
            principal = %ctx.principal().name(),
            path = %req.uri().path(),
            "principal lacks access to operation"
        );
        return Err(err.into());
    }

    tracing::debug!(principal = %ctx.principal().name(), "request authenticated");

    // middleware → extractor handoff
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// An `https` request URI, or `X-Forwarded-Proto: https` when the deployment
/// sits behind a proxy that owns that header.
fn is_secure_transport(uri: &Uri, headers: &axum::http::HeaderMap, trust_forwarded: bool) -> bool {
    if uri.scheme_str() == Some("https") {
        return true;
    }
    trust_forwarded
        && headers
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}
