use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Tournament;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTournamentRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub template_id: Uuid,

    pub start_date: Option<DateTime<Utc>>,

    pub end_date: Option<DateTime<Utc>>,
}

impl CreateTournamentRequest {
    pub fn validate_dates(&self) -> Result<(), &'static str> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            return Err("End date must be on or after start date");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitScoreRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TournamentResponse {
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

impl From<Tournament> for TournamentResponse {
    fn from(tournament: Tournament) -> Self {
        Self {
            tournament_id: tournament.tournament_id,
            name: tournament.name,
            description: tournament.description,
            organizer_id: tournament.organizer_id,
            template_id: tournament.template_id,
            status: tournament.status,
            start_date: tournament.start_date,
            end_date: tournament.end_date,
            created_at: tournament.created_at,
        }
    }
}

/// One leaderboard row. `rank` is present once a score has been submitted;
/// participants without a score trail the board unranked.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub rank: Option<i32>,
    pub user_id: Uuid,
    pub archer_name: String,
    pub session_id: Option<Uuid>,
    pub final_score: Option<i32>,
    pub final_x_count: Option<i32>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TournamentDetailResponse {
    #[serde(flatten)]
    pub tournament: TournamentResponse,
    pub template_name: Option<String>,
    pub participants: Vec<LeaderboardEntry>,
}
