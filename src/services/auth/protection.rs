//! Declarative access markers and the "does this need authentication" check.
use std::collections::BTreeSet;

/// One access-control marker, attachable to an operation or to the resource
/// that contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessMarker {
    DenyAll,
    PermitAll,
    RolesAllowed(BTreeSet<String>),
}

impl AccessMarker {
    pub fn roles_allowed<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AccessMarker::RolesAllowed(roles.into_iter().map(Into::into).collect())
    }
}

/// The markers attached to a single descriptor (operation or resource).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessMeta {
    markers: Vec<AccessMarker>,
}

impl AccessMeta {
    /// No markers: the descriptor itself does not ask for protection.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, marker: AccessMarker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn markers(&self) -> &[AccessMarker] {
        &self.markers
    }

    pub fn is_marked(&self) -> bool {
        !self.markers.is_empty()
    }
}

impl From<AccessMarker> for AccessMeta {
    fn from(marker: AccessMarker) -> Self {
        AccessMeta::none().with(marker)
    }
}

/// Registration-time descriptor of one operation: its own markers plus those of
/// its resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteInfo {
    pub resource: AccessMeta,
    pub operation: AccessMeta,
}

impl RouteInfo {
    pub fn new(resource: AccessMeta, operation: AccessMeta) -> Self {
        Self {
            resource,
            operation,
        }
    }

    pub fn is_protected(&self) -> bool {
        is_protected(&self.operation, &self.resource)
    }
}

/// Any marker on either descriptor means the caller must authenticate. Which
/// marker it is only matters later, in `authorization`.
pub fn is_protected(operation: &AccessMeta, resource: &AccessMeta) -> bool {
    operation.is_marked() || resource.is_marked()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_markers() -> Vec<AccessMarker> {
        vec![
            AccessMarker::DenyAll,
            AccessMarker::PermitAll,
            AccessMarker::roles_allowed(["admin"]),
        ]
    }

    #[test]
    fn unmarked_operation_on_unmarked_resource_is_open() {
        assert!(!is_protected(&AccessMeta::none(), &AccessMeta::none()));
        assert!(!RouteInfo::default().is_protected());
    }

    #[test]
    fn any_marker_on_the_operation_protects() {
        for marker in all_markers() {
            assert!(
                is_protected(&marker.clone().into(), &AccessMeta::none()),
                "{marker:?}"
            );
        }
    }

    #[test]
    fn any_marker_on_the_resource_protects() {
        for marker in all_markers() {
            let route = RouteInfo::new(marker.clone().into(), AccessMeta::none());
            assert!(route.is_protected(), "{marker:?}");
        }
    }

    #[test]
    fn permit_all_still_requires_authentication() {
        let route = RouteInfo::new(AccessMeta::none(), AccessMarker::PermitAll.into());
        assert!(route.is_protected());
    }

    #[test]
    fn roles_are_deduplicated() {
        let marker = AccessMarker::roles_allowed(["a", "b", "a"]);
        let AccessMarker::RolesAllowed(roles) = marker else {
            unreachable!()
        };
        assert_eq!(roles.len(), 2);
    }
}
