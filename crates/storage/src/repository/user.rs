use sqlx::PgPool;

use crate::error::{Result, StorageError};
use crate::models::User;

/// Identity boundary: resolves bearer tokens to users. Token provisioning
/// lives with the external identity collaborator.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_token(&self, token: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, username, display_name, api_token, created_at \
             FROM users WHERE api_token = $1",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(user)
    }
}
