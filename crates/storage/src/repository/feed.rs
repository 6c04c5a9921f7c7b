use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::Result;
use crate::models::FeedItem;

/// Emits feed items for the external feed collaborator. Callers treat this
/// as fire-and-forget; a failed emission never fails the scoring operation.
pub struct FeedRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FeedRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn emit(
        &self,
        user_id: Uuid,
        item_type: &str,
        data: serde_json::Value,
    ) -> Result<FeedItem> {
        let item = sqlx::query_as::<_, FeedItem>(
            "INSERT INTO feed_items (user_id, item_type, data) \
             VALUES ($1, $2, $3) \
             RETURNING feed_item_id, user_id, item_type, data, created_at",
        )
        .bind(user_id)
        .bind(item_type)
        .bind(Json(data))
        .fetch_one(self.pool)
        .await?;

        Ok(item)
    }
}
