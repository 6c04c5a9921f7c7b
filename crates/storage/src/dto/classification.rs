use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ClassificationRecord;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassificationRecordResponse {
    pub classification_id: Uuid,
    pub system: String,
    pub classification: String,
    pub round_type: String,
    pub score: i32,
    pub achieved_at: DateTime<Utc>,
    pub session_id: Option<Uuid>,
}

impl From<ClassificationRecord> for ClassificationRecordResponse {
    fn from(record: ClassificationRecord) -> Self {
        Self {
            classification_id: record.classification_id,
            system: record.system,
            classification: record.classification,
            round_type: record.round_type,
            score: record.score,
            achieved_at: record.achieved_at,
            session_id: record.session_id,
        }
    }
}

/// Most recently achieved classification per (system, round_type).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentClassificationResponse {
    pub system: String,
    pub classification: String,
    pub round_type: String,
    pub score: i32,
    pub achieved_at: DateTime<Utc>,
}
