/*
 * Responsibility
 * - response shapes for /me and /admin/users
 * - built from SecurityCtx / UserRecord (no DB or token types leak out)
 */
use serde::Serialize;

use crate::services::auth::SecurityCtx;
use crate::services::identity::UserRecord;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub name: String,
    pub roles: Vec<String>,
    pub authentication_scheme: &'static str,
    pub secure: bool,
}

impl From<&SecurityCtx> for MeResponse {
    fn from(ctx: &SecurityCtx) -> Self {
        Self {
            name: ctx.principal().name().to_string(),
            roles: ctx.principal().roles().iter().cloned().collect(),
            authentication_scheme: ctx.authentication_scheme(),
            secure: ctx.is_secure(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub subject: String,
    pub display_name: String,
    pub roles: Vec<String>,
}

impl UserResponse {
    pub fn new(subject: String, record: UserRecord) -> Self {
        Self {
            subject,
            display_name: record.display_name,
            roles: record.roles,
        }
    }
}
