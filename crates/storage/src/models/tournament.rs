use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const TOURNAMENT_STATUS_REGISTRATION: &str = "registration";
pub const TOURNAMENT_STATUS_IN_PROGRESS: &str = "in_progress";
pub const TOURNAMENT_STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tournament {
    pub tournament_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub organizer_id: Uuid,
    pub template_id: Uuid,
    pub status: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A tournament entry. `final_score`/`final_x_count` are copied from the
/// participant's completed scoring session at submit time; `rank` is frozen
/// when the tournament completes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TournamentParticipant {
    pub participant_id: Uuid,
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub session_id: Option<Uuid>,
    pub final_score: Option<i32>,
    pub final_x_count: Option<i32>,
    pub rank: Option<i32>,
    pub registered_at: DateTime<Utc>,
}
