use crate::services::auth::resolver::Principal;

/// Scheme name reported to handlers.
pub const AUTHENTICATION_SCHEME: &str = "BASIC";

/// What handlers see of an authenticated request.
///
/// Inserted into request extensions by the gate and only on a fully
/// successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityCtx {
    principal: Principal,
    secure: bool,
}

impl SecurityCtx {
    pub fn new(principal: Principal, secure: bool) -> Self {
        Self { principal, secure }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn is_in_role(&self, role: &str) -> bool {
        self.principal.has_role(role)
    }

    pub fn authentication_scheme(&self) -> &'static str {
        AUTHENTICATION_SCHEME
    }

    /// Whether the request arrived over HTTPS (directly or via a proxy).
    pub fn is_secure(&self) -> bool {
        self.secure
    }
}
