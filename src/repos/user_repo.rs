/*
 * Responsibility
 * - SQLx reads against the users / user_roles tables
 * - takes a PgPool, returns rows with the role list already aggregated
 *
 * Schema (owned by the account service):
 *   users      ("userId" uuid primary key, "userName" text not null, ...)
 *   user_roles ("userId" uuid references users, "role" text not null)
 */
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoError;

#[derive(Debug, FromRow)]
pub struct UserRoleRow {
    #[sqlx(rename = "userId")]
    pub id: Uuid,
    #[sqlx(rename = "userName")]
    pub user_name: String,
    pub roles: Vec<String>,
}

pub async fn find_with_roles(db: &PgPool, user_id: Uuid) -> Result<Option<UserRoleRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRoleRow>(
        r#"
        SELECT
            u."userId",
            u."userName",
            COALESCE(
                array_agg(r."role" ORDER BY r."role") FILTER (WHERE r."role" IS NOT NULL),
                '{}'::text[]
            ) AS roles
        FROM users u
        LEFT JOIN user_roles r ON r."userId" = u."userId"
        WHERE u."userId" = $1
        GROUP BY u."userId", u."userName"
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}
