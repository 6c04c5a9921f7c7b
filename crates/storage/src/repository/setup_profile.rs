use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::SetupProfile;

/// Narrow view over the equipment collaborator's data: the scoring engine
/// only ever needs an ownership check and a display name.
pub struct SetupProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SetupProfileRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_owned(&self, setup_id: Uuid, user_id: Uuid) -> Result<SetupProfile> {
        let profile = sqlx::query_as::<_, SetupProfile>(
            "SELECT setup_id, user_id, name, bow_type, draw_weight, created_at \
             FROM setup_profiles \
             WHERE setup_id = $1 AND user_id = $2",
        )
        .bind(setup_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(profile)
    }

    pub async fn find_name(&self, setup_id: Uuid) -> Result<Option<String>> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM setup_profiles WHERE setup_id = $1")
                .bind(setup_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(name)
    }
}
