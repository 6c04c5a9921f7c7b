use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::StorageError;

/// Session lifecycle. `Completed` and `Abandoned` are terminal; every state
/// guard in the scoring engine goes through this enum rather than raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Abandoned)
    }

    /// The only legal transitions are in_progress -> completed and
    /// in_progress -> abandoned.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::InProgress, SessionStatus::Completed)
                | (SessionStatus::InProgress, SessionStatus::Abandoned)
        )
    }
}

impl TryFrom<String> for SessionStatus {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(StorageError::validation(format!(
                "Unknown session status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One archer's attempt at a round template. The `total_*` aggregates are
/// derived: after every mutating operation they equal the sums over the
/// session's ends and arrows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ScoringSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub setup_profile_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    pub total_score: i32,
    pub total_x_count: i32,
    pub total_arrows: i32,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub weather: Option<String>,
    pub share_token: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A group of arrows scored together. `end_number` is dense and 1-based,
/// recomputed from the live end count at submission time so undo keeps the
/// numbering gap-free. `stage_id` goes null when a template edit replaces
/// the stage; the end keeps its own scores.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct End {
    pub end_id: Uuid,
    pub session_id: Uuid,
    pub stage_id: Option<Uuid>,
    pub end_number: i32,
    pub end_total: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Arrow {
    pub arrow_id: Uuid,
    pub end_id: Uuid,
    pub arrow_number: i32,
    pub score_value: String,
    pub score_numeric: i32,
    pub x_pos: Option<f64>,
    pub y_pos: Option<f64>,
}

/// Best score for a (user, template) pair. One row per pair, updated in
/// place when a strictly better score lands.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PersonalRecord {
    pub record_id: Uuid,
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub session_id: Uuid,
    pub score: i32,
    pub achieved_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_transitions() {
        assert!(SessionStatus::InProgress.can_transition_to(SessionStatus::Completed));
        assert!(SessionStatus::InProgress.can_transition_to(SessionStatus::Abandoned));
        assert!(!SessionStatus::InProgress.can_transition_to(SessionStatus::InProgress));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for terminal in [SessionStatus::Completed, SessionStatus::Abandoned] {
            assert!(terminal.is_terminal());
            for next in [
                SessionStatus::InProgress,
                SessionStatus::Completed,
                SessionStatus::Abandoned,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            SessionStatus::InProgress,
            SessionStatus::Completed,
            SessionStatus::Abandoned,
        ] {
            assert_eq!(
                SessionStatus::try_from(status.as_str().to_string()).unwrap(),
                status
            );
        }
        assert!(SessionStatus::try_from("paused".to_string()).is_err());
    }
}
