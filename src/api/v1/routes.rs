/*
 * Responsibility
 * - define the v1 URL layout
 * - declare the access markers of every operation and resource here, at registration
 */
use axum::{
    Router,
    routing::{delete, get},
};

use crate::middleware::auth::Resource;
use crate::services::auth::{AccessMarker, AccessMeta};
use crate::state::AppState;

use crate::api::v1::handlers::{
    admin::{get_user, revoke_sessions},
    health::health,
    me::me,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    let public = Resource::new("", state.gate.clone())
        .operation("/health", get(health), AccessMeta::none())
        .operation("/me", get(me), AccessMarker::PermitAll);

    let admin = Resource::new("/admin", state.gate.clone())
        .marker(AccessMarker::roles_allowed(["admin"]))
        .operation("/users/{subject}", get(get_user), AccessMeta::none())
        .operation("/sessions", delete(revoke_sessions), AccessMarker::DenyAll);

    public.into_router().merge(admin.into_router())
}
