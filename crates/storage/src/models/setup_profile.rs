use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Equipment configuration a session can be shot with. Owned by the
/// equipment collaborator; the scoring core only checks ownership.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SetupProfile {
    pub setup_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub bow_type: Option<String>,
    pub draw_weight: Option<f64>,
    pub created_at: DateTime<Utc>,
}
