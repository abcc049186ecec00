/*
 * Responsibility
 * - register operations together with their access markers
 * - resource-level markers apply to every operation registered under the resource
 * - every operation gets the gate bound to its own RouteInfo
 */
use axum::{Router, routing::MethodRouter};

use crate::middleware::auth::access;
use crate::services::auth::{AccessMarker, AccessMeta, AuthGate, RouteInfo};

/// A group of operations under a common path prefix.
///
/// ```ignore
/// let admin = Resource::new("/admin", state.gate.clone())
///     .marker(AccessMarker::roles_allowed(["admin"]))
///     .operation("/users/{subject}", get(get_user), AccessMeta::none())
///     .operation("/sessions", delete(revoke_sessions), AccessMarker::DenyAll)
///     .into_router();
/// ```
pub struct Resource<S> {
    prefix: String,
    gate: AuthGate,
    markers: AccessMeta,
    operations: Vec<(String, MethodRouter<S>, AccessMeta)>,
}

impl<S> Resource<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(prefix: impl Into<String>, gate: AuthGate) -> Self {
        Self {
            prefix: prefix.into(),
            gate,
            markers: AccessMeta::none(),
            operations: Vec::new(),
        }
    }

    /// Add a resource-level marker (applies to operations registered before or after).
    pub fn marker(mut self, marker: AccessMarker) -> Self {
        self.markers = self.markers.with(marker);
        self
    }

    pub fn operation(
        mut self,
        path: &str,
        method_router: MethodRouter<S>,
        markers: impl Into<AccessMeta>,
    ) -> Self {
        let path = join(&self.prefix, path);
        self.operations.push((path, method_router, markers.into()));
        self
    }

    pub fn into_router(self) -> Router<S> {
        let Self {
            gate,
            markers,
            operations,
            ..
        } = self;

        operations
            .into_iter()
            .fold(Router::new(), |router, (path, method_router, operation)| {
                let route = RouteInfo::new(markers.clone(), operation);
                router.route(&path, access::guard(method_router, gate.clone(), route))
            })
    }
}

fn join(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    match (prefix.is_empty(), path.trim_start_matches('/')) {
        (true, "") => "/".to_string(),
        (true, rest) => format!("/{rest}"),
        (false, "") => prefix.to_string(),
        (false, rest) => format!("{prefix}/{rest}"),
    }
}
