use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Arrow, End, ScoringSession, SessionStatus};

/// Payload for starting a scoring session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSessionRequest {
    pub template_id: Uuid,

    pub setup_profile_id: Option<Uuid>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    #[validate(length(max = 200))]
    pub location: Option<String>,

    #[validate(length(max = 100))]
    pub weather: Option<String>,
}

/// One arrow within a submitted end. `score_value` is the raw ring token;
/// the engine resolves it to a numeric score against the stage rules.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ArrowScoreInput {
    #[validate(length(min = 1, max = 5, message = "score_value must be between 1 and 5 characters"))]
    pub score_value: String,

    pub x_pos: Option<f64>,

    pub y_pos: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitEndRequest {
    pub stage_id: Uuid,

    #[validate(length(min = 1, max = 12, message = "An end carries between 1 and 12 arrows"))]
    #[validate(nested)]
    pub arrows: Vec<ArrowScoreInput>,
}

/// Optional overrides applied when completing a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CompleteSessionRequest {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    #[validate(length(max = 200))]
    pub location: Option<String>,

    #[validate(length(max = 100))]
    pub weather: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SessionFilter {
    #[serde(flatten)]
    pub pagination: super::common::PaginationParams,
    pub template_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
}

impl SessionFilter {
    pub fn validate(&self) -> Result<(), String> {
        self.pagination.validate()?;

        if let (Some(from), Some(to)) = (self.date_from, self.date_to)
            && to < from
        {
            return Err("date_to must be on or after date_from".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArrowResponse {
    pub arrow_id: Uuid,
    pub arrow_number: i32,
    pub score_value: String,
    pub score_numeric: i32,
    pub x_pos: Option<f64>,
    pub y_pos: Option<f64>,
}

impl From<Arrow> for ArrowResponse {
    fn from(arrow: Arrow) -> Self {
        Self {
            arrow_id: arrow.arrow_id,
            arrow_number: arrow.arrow_number,
            score_value: arrow.score_value,
            score_numeric: arrow.score_numeric,
            x_pos: arrow.x_pos,
            y_pos: arrow.y_pos,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EndResponse {
    pub end_id: Uuid,
    pub stage_id: Option<Uuid>,
    pub end_number: i32,
    pub end_total: i32,
    pub created_at: DateTime<Utc>,
    pub arrows: Vec<ArrowResponse>,
}

impl EndResponse {
    pub fn new(end: End, arrows: Vec<Arrow>) -> Self {
        Self {
            end_id: end.end_id,
            stage_id: end.stage_id,
            end_number: end.end_number,
            end_total: end.end_total,
            created_at: end.created_at,
            arrows: arrows.into_iter().map(ArrowResponse::from).collect(),
        }
    }
}

/// Full session detail, including ends and the fresh personal-best flag.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub template_name: Option<String>,
    pub setup_profile_id: Option<Uuid>,
    pub setup_profile_name: Option<String>,
    pub status: SessionStatus,
    pub total_score: i32,
    pub total_x_count: i32,
    pub total_arrows: i32,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub weather: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_personal_best: bool,
    pub ends: Vec<EndResponse>,
}

impl SessionResponse {
    pub fn new(
        session: ScoringSession,
        template_name: Option<String>,
        setup_profile_name: Option<String>,
        is_personal_best: bool,
        ends: Vec<EndResponse>,
    ) -> Self {
        Self {
            session_id: session.session_id,
            user_id: session.user_id,
            template_id: session.template_id,
            template_name,
            setup_profile_id: session.setup_profile_id,
            setup_profile_name,
            status: session.status,
            total_score: session.total_score,
            total_x_count: session.total_x_count,
            total_arrows: session.total_arrows,
            notes: session.notes,
            location: session.location,
            weather: session.weather,
            started_at: session.started_at,
            completed_at: session.completed_at,
            is_personal_best,
            ends,
        }
    }
}

/// Compact row for session listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub template_id: Uuid,
    pub template_name: String,
    pub setup_profile_name: Option<String>,
    pub status: SessionStatus,
    pub total_score: i32,
    pub total_x_count: i32,
    pub total_arrows: i32,
    pub location: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundTypeAverage {
    pub template_name: String,
    pub avg_score: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrendPoint {
    pub session_id: Uuid,
    pub template_name: String,
    pub score: i32,
    pub max_score: i32,
    pub percentage: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub total_arrows: i64,
    pub total_x_count: i64,
    pub personal_best_score: Option<i32>,
    pub personal_best_template: Option<String>,
    pub avg_by_round_type: Vec<RoundTypeAverage>,
    pub recent_trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PersonalRecordResponse {
    pub template_id: Uuid,
    pub template_name: String,
    pub score: i32,
    pub max_score: i32,
    pub session_id: Uuid,
    pub achieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShareLinkResponse {
    pub share_token: String,
    pub url: String,
}

/// Public, read-only projection served for a valid share token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SharedSessionResponse {
    pub archer_name: String,
    pub template_name: Option<String>,
    pub total_score: i32,
    pub total_x_count: i32,
    pub total_arrows: i32,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub weather: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub ends: Vec<EndResponse>,
}
