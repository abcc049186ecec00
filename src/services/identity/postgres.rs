use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::user_repo;
use crate::services::identity::store::{IdentityStore, IdentityStoreError, UserRecord};

/// Identity store over the `users` / `user_roles` tables.
///
/// Subjects are user UUIDs; anything that does not parse as one is unknown.
#[derive(Clone, Debug)]
pub struct PgIdentityStore {
    db: PgPool,
}

impl PgIdentityStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn lookup(&self, subject: &str) -> Result<Option<UserRecord>, IdentityStoreError> {
        let Ok(user_id) = Uuid::parse_str(subject) else {
            return Ok(None);
        };

        let row = user_repo::find_with_roles(&self.db, user_id).await?;

        Ok(row.map(|r| UserRecord {
            display_name: r.user_name,
            roles: r.roles,
        }))
    }
}
