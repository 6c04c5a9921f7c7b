use std::cmp::Ordering;

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::dto::tournament::{CreateTournamentRequest, LeaderboardEntry};
use crate::error::{Result, StorageError};
use crate::models::tournament::{
    TOURNAMENT_STATUS_COMPLETED, TOURNAMENT_STATUS_IN_PROGRESS, TOURNAMENT_STATUS_REGISTRATION,
};
use crate::models::{SessionStatus, Tournament, TournamentParticipant};

const TOURNAMENT_COLUMNS: &str = "tournament_id, name, description, organizer_id, template_id, \
     status, start_date, end_date, created_at";

const PARTICIPANT_COLUMNS: &str = "participant_id, tournament_id, user_id, session_id, \
     final_score, final_x_count, rank, registered_at";

/// Deterministic leaderboard order: final score descending, X-count
/// descending, registration time ascending. Participants without a
/// submitted score trail the board and receive no rank.
pub fn rank_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| match (a.final_score, b.final_score) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.registered_at.cmp(&b.registered_at),
        (Some(score_a), Some(score_b)) => score_b
            .cmp(&score_a)
            .then_with(|| {
                b.final_x_count
                    .unwrap_or(0)
                    .cmp(&a.final_x_count.unwrap_or(0))
            })
            .then_with(|| a.registered_at.cmp(&b.registered_at)),
    });

    let mut next_rank = 1;
    for entry in entries.iter_mut() {
        entry.rank = if entry.final_score.is_some() {
            let rank = next_rank;
            next_rank += 1;
            Some(rank)
        } else {
            None
        };
    }
}

/// Links independently-run scoring sessions to tournament standings.
pub struct TournamentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TournamentRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, organizer: Uuid, req: &CreateTournamentRequest) -> Result<Tournament> {
        let template_exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM round_templates WHERE template_id = $1")
                .bind(req.template_id)
                .fetch_optional(self.pool)
                .await?;
        if template_exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let sql = format!(
            "INSERT INTO tournaments (name, description, organizer_id, template_id, status, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {TOURNAMENT_COLUMNS}"
        );
        let tournament = sqlx::query_as::<_, Tournament>(&sql)
            .bind(&req.name)
            .bind(&req.description)
            .bind(organizer)
            .bind(req.template_id)
            .bind(TOURNAMENT_STATUS_REGISTRATION)
            .bind(req.start_date)
            .bind(req.end_date)
            .fetch_one(self.pool)
            .await?;

        Ok(tournament)
    }

    pub async fn list(&self) -> Result<Vec<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments ORDER BY created_at DESC");
        let tournaments = sqlx::query_as::<_, Tournament>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(tournaments)
    }

    pub async fn find_by_id(&self, tournament_id: Uuid) -> Result<Tournament> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE tournament_id = $1");
        let tournament = sqlx::query_as::<_, Tournament>(&sql)
            .bind(tournament_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(tournament)
    }

    pub async fn register(&self, tournament_id: Uuid, user_id: Uuid) -> Result<TournamentParticipant> {
        let tournament = self.find_by_id(tournament_id).await?;
        if tournament.status == TOURNAMENT_STATUS_COMPLETED {
            return Err(StorageError::validation(
                "Registration is closed for a completed tournament",
            ));
        }

        let sql = format!(
            "INSERT INTO tournament_participants (tournament_id, user_id) \
             VALUES ($1, $2) \
             RETURNING {PARTICIPANT_COLUMNS}"
        );
        let participant = sqlx::query_as::<_, TournamentParticipant>(&sql)
            .bind(tournament_id)
            .bind(user_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                let err = StorageError::from(e);
                if err.is_unique_violation() {
                    StorageError::conflict("Already registered for this tournament")
                } else {
                    err
                }
            })?;

        Ok(participant)
    }

    /// Copy a completed session's totals onto the participant. Idempotent:
    /// resubmitting overwrites the previous score.
    pub async fn submit_score(
        &self,
        tournament_id: Uuid,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<TournamentParticipant> {
        let mut tx = self.pool.begin().await?;

        let tournament_sql = format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE tournament_id = $1 FOR UPDATE"
        );
        let tournament = sqlx::query_as::<_, Tournament>(&tournament_sql)
            .bind(tournament_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StorageError::NotFound)?;
        if tournament.status == TOURNAMENT_STATUS_COMPLETED {
            return Err(StorageError::validation(
                "Tournament is already completed",
            ));
        }

        let participant_sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM tournament_participants \
             WHERE tournament_id = $1 AND user_id = $2 FOR UPDATE"
        );
        let participant = sqlx::query_as::<_, TournamentParticipant>(&participant_sql)
            .bind(tournament_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StorageError::NotFound)?;

        #[derive(FromRow)]
        struct SessionTotals {
            status: String,
            total_score: i32,
            total_x_count: i32,
        }

        let session = sqlx::query_as::<_, SessionTotals>(
            "SELECT status, total_score, total_x_count FROM scoring_sessions \
             WHERE session_id = $1 AND user_id = $2",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        if SessionStatus::try_from(session.status)? != SessionStatus::Completed {
            return Err(StorageError::validation(
                "Only completed sessions can be submitted to a tournament",
            ));
        }

        let update_sql = format!(
            "UPDATE tournament_participants \
             SET session_id = $2, final_score = $3, final_x_count = $4 \
             WHERE participant_id = $1 \
             RETURNING {PARTICIPANT_COLUMNS}"
        );
        let participant = sqlx::query_as::<_, TournamentParticipant>(&update_sql)
            .bind(participant.participant_id)
            .bind(session_id)
            .bind(session.total_score)
            .bind(session.total_x_count)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE tournaments SET status = $2 WHERE tournament_id = $1 AND status != $2")
            .bind(tournament_id)
            .bind(TOURNAMENT_STATUS_IN_PROGRESS)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(participant)
    }

    /// Current standings. Live tournaments are ranked on the fly; completed
    /// tournaments report the frozen ranks.
    pub async fn leaderboard(&self, tournament_id: Uuid) -> Result<Vec<LeaderboardEntry>> {
        let tournament = self.find_by_id(tournament_id).await?;
        let mut entries = self.participant_entries(tournament_id).await?;

        if tournament.status == TOURNAMENT_STATUS_COMPLETED {
            entries.sort_by(|a, b| match (a.rank, b.rank) {
                (Some(rank_a), Some(rank_b)) => rank_a.cmp(&rank_b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.registered_at.cmp(&b.registered_at),
            });
        } else {
            rank_entries(&mut entries);
        }

        Ok(entries)
    }

    /// Freeze standings: persist the computed order and mark the tournament
    /// completed. Organizer only.
    pub async fn complete(&self, tournament_id: Uuid, requester: Uuid) -> Result<Tournament> {
        let mut tx = self.pool.begin().await?;

        let tournament_sql = format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE tournament_id = $1 FOR UPDATE"
        );
        let tournament = sqlx::query_as::<_, Tournament>(&tournament_sql)
            .bind(tournament_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StorageError::NotFound)?;

        if tournament.organizer_id != requester {
            return Err(StorageError::forbidden(
                "Only the organizer can complete a tournament",
            ));
        }
        if tournament.status == TOURNAMENT_STATUS_COMPLETED {
            return Err(StorageError::validation("Tournament is already completed"));
        }

        let participant_sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM tournament_participants WHERE tournament_id = $1"
        );
        let participants = sqlx::query_as::<_, TournamentParticipant>(&participant_sql)
            .bind(tournament_id)
            .fetch_all(&mut *tx)
            .await?;

        let mut entries: Vec<LeaderboardEntry> = participants
            .into_iter()
            .map(|p| LeaderboardEntry {
                rank: None,
                user_id: p.user_id,
                archer_name: String::new(),
                session_id: p.session_id,
                final_score: p.final_score,
                final_x_count: p.final_x_count,
                registered_at: p.registered_at,
            })
            .collect();
        rank_entries(&mut entries);

        for entry in &entries {
            sqlx::query(
                "UPDATE tournament_participants SET rank = $3 \
                 WHERE tournament_id = $1 AND user_id = $2",
            )
            .bind(tournament_id)
            .bind(entry.user_id)
            .bind(entry.rank)
            .execute(&mut *tx)
            .await?;
        }

        let complete_sql = format!(
            "UPDATE tournaments SET status = $2 WHERE tournament_id = $1 \
             RETURNING {TOURNAMENT_COLUMNS}"
        );
        let tournament = sqlx::query_as::<_, Tournament>(&complete_sql)
            .bind(tournament_id)
            .bind(TOURNAMENT_STATUS_COMPLETED)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(tournament)
    }

    async fn participant_entries(&self, tournament_id: Uuid) -> Result<Vec<LeaderboardEntry>> {
        #[derive(FromRow)]
        struct EntryRow {
            user_id: Uuid,
            archer_name: String,
            session_id: Option<Uuid>,
            final_score: Option<i32>,
            final_x_count: Option<i32>,
            rank: Option<i32>,
            registered_at: chrono::DateTime<chrono::Utc>,
        }

        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT p.user_id, COALESCE(u.display_name, u.username) AS archer_name, \
                    p.session_id, p.final_score, p.final_x_count, p.rank, p.registered_at \
             FROM tournament_participants p \
             JOIN users u ON p.user_id = u.user_id \
             WHERE p.tournament_id = $1 \
             ORDER BY p.registered_at",
        )
        .bind(tournament_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| LeaderboardEntry {
                rank: row.rank,
                user_id: row.user_id,
                archer_name: row.archer_name,
                session_id: row.session_id,
                final_score: row.final_score,
                final_x_count: row.final_x_count,
                registered_at: row.registered_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn entry(
        name: &str,
        score: Option<i32>,
        x_count: Option<i32>,
        registered_minute: u32,
    ) -> LeaderboardEntry {
        LeaderboardEntry {
            rank: None,
            user_id: Uuid::new_v4(),
            archer_name: name.to_string(),
            session_id: None,
            final_score: score,
            final_x_count: x_count,
            registered_at: Utc
                .with_ymd_and_hms(2025, 6, 1, 9, registered_minute, 0)
                .unwrap(),
        }
    }

    fn names(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.archer_name.as_str()).collect()
    }

    #[test]
    fn test_orders_by_score_descending() {
        let mut entries = vec![
            entry("bronze", Some(250), Some(2), 0),
            entry("gold", Some(290), Some(10), 1),
            entry("silver", Some(270), Some(5), 2),
        ];
        rank_entries(&mut entries);
        assert_eq!(names(&entries), vec!["gold", "silver", "bronze"]);
        assert_eq!(
            entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![Some(1), Some(2), Some(3)]
        );
    }

    #[test]
    fn test_score_tie_broken_by_x_count() {
        let mut entries = vec![
            entry("fewer_xs", Some(280), Some(3), 0),
            entry("more_xs", Some(280), Some(9), 1),
        ];
        rank_entries(&mut entries);
        assert_eq!(names(&entries), vec!["more_xs", "fewer_xs"]);
    }

    #[test]
    fn test_full_tie_broken_by_registration_time() {
        let mut entries = vec![
            entry("late", Some(280), Some(6), 30),
            entry("early", Some(280), Some(6), 5),
        ];
        rank_entries(&mut entries);
        assert_eq!(names(&entries), vec!["early", "late"]);
        assert_eq!(entries[0].rank, Some(1));
        assert_eq!(entries[1].rank, Some(2));
    }

    #[test]
    fn test_unscored_participants_trail_unranked() {
        let mut entries = vec![
            entry("no_score", None, None, 0),
            entry("scored", Some(100), Some(0), 1),
        ];
        rank_entries(&mut entries);
        assert_eq!(names(&entries), vec!["scored", "no_score"]);
        assert_eq!(entries[0].rank, Some(1));
        assert_eq!(entries[1].rank, None);
    }

    #[test]
    fn test_missing_x_count_treated_as_zero() {
        let mut entries = vec![
            entry("with_xs", Some(280), Some(1), 1),
            entry("no_xs_recorded", Some(280), None, 0),
        ];
        rank_entries(&mut entries);
        assert_eq!(names(&entries), vec!["with_xs", "no_xs_recorded"]);
    }
}
