use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// A feed entry emitted at session completion. Written fire-and-forget;
/// read by the external feed collaborator, not by this crate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedItem {
    pub feed_item_id: Uuid,
    pub user_id: Uuid,
    pub item_type: String,
    pub data: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
