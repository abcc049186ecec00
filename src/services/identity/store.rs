use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::ConfigError;
use crate::repos::error::RepoError;
use crate::services::cache::CacheError;

/// What the directory knows about a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub display_name: String,
    pub roles: Vec<String>,
}

impl UserRecord {
    pub fn new<I, S>(display_name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            display_name: display_name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum IdentityStoreError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Lookup-by-subject over some directory of users.
///
/// `Ok(None)` means the subject is unknown. `Err(_)` is a backend failure;
/// the gate treats both as "could not authenticate" (fail-closed).
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn lookup(&self, subject: &str) -> Result<Option<UserRecord>, IdentityStoreError>;
}

/// Fixed set of users held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityStore {
    users: HashMap<String, UserRecord>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, subject: impl Into<String>, record: UserRecord) -> Self {
        self.users.insert(subject.into(), record);
        self
    }

    /// Parse `subject:name:role1|role2;subject2:name2:` (roles may be empty).
    pub fn from_seed(seed: &str) -> Result<Self, ConfigError> {
        let mut store = Self::new();

        for entry in seed.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let mut fields = entry.splitn(3, ':');
            let subject = fields.next().map(str::trim).unwrap_or_default();
            let name = fields
                .next()
                .map(str::trim)
                .ok_or(ConfigError::Invalid("IDENTITY_SEED"))?;
            let roles = fields.next().unwrap_or_default();

            if subject.is_empty() || name.is_empty() {
                return Err(ConfigError::Invalid("IDENTITY_SEED"));
            }

            let roles = roles
                .split('|')
                .map(str::trim)
                .filter(|r| !r.is_empty());
            store = store.with_user(subject, UserRecord::new(name, roles));
        }

        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn lookup(&self, subject: &str) -> Result<Option<UserRecord>, IdentityStoreError> {
        Ok(self.users.get(subject).cloned())
    }
}
