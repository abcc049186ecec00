use serde::Serialize;
use std::collections::BTreeSet;
use std::{sync::Arc, time::Duration};

use crate::services::auth::error::AuthError;
use crate::services::identity::{IdentityStore, UserRecord};

/// The authenticated identity bound to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    name: String,
    roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl From<UserRecord> for Principal {
    fn from(record: UserRecord) -> Self {
        Principal::new(record.display_name, record.roles)
    }
}

/// Maps a token subject to a [`Principal`] through the identity store.
///
/// The store call is the only I/O on the authentication path, so it is bounded
/// by `timeout`. Unknown subjects, store errors and timeouts all resolve to
/// `PrincipalNotFound`.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
    timeout: Duration,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("backend", &self.store.backend_name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn resolve(&self, subject: &str) -> Result<Principal, AuthError> {
        let lookup = tokio::time::timeout(self.timeout, self.store.lookup(subject)).await;

        match lookup {
            Ok(Ok(Some(record))) => Ok(record.into()),
            Ok(Ok(None)) => Err(AuthError::PrincipalNotFound),
            Ok(Err(err)) => {
                tracing::warn!(
                    backend = self.store.backend_name(),
                    error = %err,
                    "identity lookup failed"
                );
                Err(AuthError::PrincipalNotFound)
            }
            Err(_) => {
                tracing::warn!(
                    backend = self.store.backend_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "identity lookup timed out"
                );
                Err(AuthError::PrincipalNotFound)
            }
        }
    }
}
