use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Append-only history of classification achievements. Every qualifying
/// completion adds a row; "current" is computed by callers as the most
/// recently achieved row per (system, round_type).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassificationRecord {
    pub classification_id: Uuid,
    pub user_id: Uuid,
    pub system: String,
    pub classification: String,
    pub round_type: String,
    pub score: i32,
    pub achieved_at: DateTime<Utc>,
    pub session_id: Option<Uuid>,
}
