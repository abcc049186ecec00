//! Marker enforcement after authentication.
//!
//! Operation markers override resource markers. Within one descriptor
//! `DenyAll` beats `RolesAllowed`, which beats `PermitAll`; several
//! `RolesAllowed` markers are combined.
use std::collections::BTreeSet;

use crate::services::auth::context::SecurityCtx;
use crate::services::auth::error::AuthError;
use crate::services::auth::protection::{AccessMarker, AccessMeta, RouteInfo};

pub fn authorize(route: &RouteInfo, ctx: &SecurityCtx) -> Result<(), AuthError> {
    let effective = effective_markers(route);

    if effective
        .markers()
        .iter()
        .any(|m| matches!(m, AccessMarker::DenyAll))
    {
        return Err(AuthError::AccessDenied);
    }

    let allowed: BTreeSet<&str> = effective
        .markers()
        .iter()
        .filter_map(|m| match m {
            AccessMarker::RolesAllowed(roles) => Some(roles),
            _ => None,
        })
        .flatten()
        .map(String::as_str)
        .collect();

    let has_role_marker = effective
        .markers()
        .iter()
        .any(|m| matches!(m, AccessMarker::RolesAllowed(_)));

    if has_role_marker && !allowed.iter().any(|role| ctx.is_in_role(role)) {
        return Err(AuthError::AccessDenied);
    }

    Ok(())
}

fn effective_markers(route: &RouteInfo) -> &AccessMeta {
    if route.operation.is_marked() {
        &route.operation
    } else {
        &route.resource
    }
}
