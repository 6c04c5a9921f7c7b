use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dto::scoring::{
    ArrowScoreInput, EndResponse, RoundTypeAverage, SessionFilter, SessionSummary, StatsResponse,
    TrendPoint,
};
use crate::error::{Result, StorageError};
use crate::models::{Arrow, End, RoundStage, ScoringSession, SessionStatus};

pub(crate) const SESSION_COLUMNS: &str = "session_id, user_id, template_id, setup_profile_id, \
     status, total_score, total_x_count, total_arrows, notes, location, weather, share_token, \
     started_at, completed_at";

const END_COLUMNS: &str = "end_id, session_id, stage_id, end_number, end_total, created_at";

const ARROW_COLUMNS: &str = "arrow_id, end_id, arrow_number, score_value, score_numeric, x_pos, y_pos";

const STAGE_COLUMNS: &str = "stage_id, template_id, stage_order, name, distance, num_ends, \
     arrows_per_end, allowed_values, value_score_map, max_score_per_arrow";

/// Repository for the scoring-session state machine. Every mutating
/// operation runs as one transaction: end/arrow writes and the session
/// aggregates commit together or not at all.
pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Start a session in `in_progress` with zeroed aggregates.
    pub async fn create(
        &self,
        user_id: Uuid,
        template_id: Uuid,
        setup_profile_id: Option<Uuid>,
        notes: Option<&str>,
        location: Option<&str>,
        weather: Option<&str>,
    ) -> Result<ScoringSession> {
        let template_exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM round_templates WHERE template_id = $1")
                .bind(template_id)
                .fetch_optional(self.pool)
                .await?;
        if template_exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let sql = format!(
            "INSERT INTO scoring_sessions \
                 (user_id, template_id, setup_profile_id, status, notes, location, weather) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SESSION_COLUMNS}"
        );
        let session = sqlx::query_as::<_, ScoringSession>(&sql)
            .bind(user_id)
            .bind(template_id)
            .bind(setup_profile_id)
            .bind(SessionStatus::InProgress.as_str())
            .bind(notes)
            .bind(location)
            .bind(weather)
            .fetch_one(self.pool)
            .await?;

        Ok(session)
    }

    /// Fetch a session the caller owns. Missing id and foreign ownership are
    /// indistinguishable to the caller.
    pub async fn find_owned(&self, session_id: Uuid, user_id: Uuid) -> Result<ScoringSession> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM scoring_sessions \
             WHERE session_id = $1 AND user_id = $2"
        );
        let session = sqlx::query_as::<_, ScoringSession>(&sql)
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(session)
    }

    /// Same ownership rule, but locks the row for the current transaction.
    pub(crate) async fn find_owned_for_update(
        conn: &mut PgConnection,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<ScoringSession> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM scoring_sessions \
             WHERE session_id = $1 AND user_id = $2 FOR UPDATE"
        );
        let session = sqlx::query_as::<_, ScoringSession>(&sql)
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(conn)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(session)
    }

    /// Validate and persist a submitted end, updating the session aggregates
    /// in the same transaction. `end_number` is the live end count plus one,
    /// so numbering stays dense across undos; the unique (session_id,
    /// end_number) constraint turns a concurrent double-submit into a
    /// conflict instead of corrupted totals.
    pub async fn submit_end(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        stage_id: Uuid,
        arrows: &[ArrowScoreInput],
    ) -> Result<EndResponse> {
        let mut tx = self.pool.begin().await?;

        let session = Self::find_owned_for_update(&mut *tx, session_id, user_id).await?;
        if session.status != SessionStatus::InProgress {
            return Err(StorageError::validation("Session is not in progress"));
        }

        let stage_sql = format!("SELECT {STAGE_COLUMNS} FROM round_stages WHERE stage_id = $1");
        let stage = sqlx::query_as::<_, RoundStage>(&stage_sql)
            .bind(stage_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StorageError::NotFound)?;

        let values: Vec<String> = arrows.iter().map(|a| a.score_value.clone()).collect();
        let scored = stage.score_end(&values)?;

        let end_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM ends WHERE session_id = $1")
                .bind(session_id)
                .fetch_one(&mut *tx)
                .await?;
        let end_number = end_count as i32 + 1;

        let end_sql = format!(
            "INSERT INTO ends (session_id, stage_id, end_number, end_total) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {END_COLUMNS}"
        );
        let end = sqlx::query_as::<_, End>(&end_sql)
            .bind(session_id)
            .bind(stage_id)
            .bind(end_number)
            .bind(scored.end_total)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                let err = StorageError::from(e);
                if err.is_unique_violation() {
                    StorageError::conflict("Another end was submitted concurrently")
                } else {
                    err
                }
            })?;

        let arrow_sql = format!(
            "INSERT INTO arrows (end_id, arrow_number, score_value, score_numeric, x_pos, y_pos) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ARROW_COLUMNS}"
        );
        let mut created_arrows = Vec::with_capacity(scored.arrows.len());
        for (scored_arrow, input) in scored.arrows.iter().zip(arrows) {
            let arrow = sqlx::query_as::<_, Arrow>(&arrow_sql)
                .bind(end.end_id)
                .bind(scored_arrow.arrow_number)
                .bind(&scored_arrow.score_value)
                .bind(scored_arrow.score_numeric)
                .bind(input.x_pos)
                .bind(input.y_pos)
                .fetch_one(&mut *tx)
                .await?;
            created_arrows.push(arrow);
        }

        sqlx::query(
            "UPDATE scoring_sessions \
             SET total_score = total_score + $2, \
                 total_x_count = total_x_count + $3, \
                 total_arrows = total_arrows + $4 \
             WHERE session_id = $1",
        )
        .bind(session_id)
        .bind(scored.end_total)
        .bind(scored.x_count)
        .bind(arrows.len() as i32)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(EndResponse::new(end, created_arrows))
    }

    /// Remove the most recent end (highest end_number) and subtract its
    /// contribution from the aggregates; the exact inverse of `submit_end`.
    pub async fn undo_last_end(&self, session_id: Uuid, user_id: Uuid) -> Result<ScoringSession> {
        let mut tx = self.pool.begin().await?;

        let session = Self::find_owned_for_update(&mut *tx, session_id, user_id).await?;
        if session.status != SessionStatus::InProgress {
            return Err(StorageError::validation("Session is not in progress"));
        }

        let end_sql = format!(
            "SELECT {END_COLUMNS} FROM ends \
             WHERE session_id = $1 \
             ORDER BY end_number DESC \
             LIMIT 1"
        );
        let last_end = sqlx::query_as::<_, End>(&end_sql)
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StorageError::validation("No ends to undo"))?;

        #[derive(FromRow)]
        struct EndContribution {
            arrow_count: i64,
            x_count: i64,
        }

        let contribution = sqlx::query_as::<_, EndContribution>(
            "SELECT COUNT(*) AS arrow_count, \
                    COUNT(*) FILTER (WHERE score_value = 'X') AS x_count \
             FROM arrows WHERE end_id = $1",
        )
        .bind(last_end.end_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM arrows WHERE end_id = $1")
            .bind(last_end.end_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM ends WHERE end_id = $1")
            .bind(last_end.end_id)
            .execute(&mut *tx)
            .await?;

        let update_sql = format!(
            "UPDATE scoring_sessions \
             SET total_score = total_score - $2, \
                 total_x_count = total_x_count - $3, \
                 total_arrows = total_arrows - $4 \
             WHERE session_id = $1 \
             RETURNING {SESSION_COLUMNS}"
        );
        let session = sqlx::query_as::<_, ScoringSession>(&update_sql)
            .bind(session_id)
            .bind(last_end.end_total)
            .bind(contribution.x_count as i32)
            .bind(contribution.arrow_count as i32)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(session)
    }

    /// in_progress -> abandoned. No derived-data side effects.
    pub async fn abandon(&self, session_id: Uuid, user_id: Uuid) -> Result<ScoringSession> {
        let mut tx = self.pool.begin().await?;

        let session = Self::find_owned_for_update(&mut *tx, session_id, user_id).await?;
        if !session.status.can_transition_to(SessionStatus::Abandoned) {
            return Err(StorageError::validation(
                "Only in-progress sessions can be abandoned",
            ));
        }

        let sql = format!(
            "UPDATE scoring_sessions SET status = $2 \
             WHERE session_id = $1 \
             RETURNING {SESSION_COLUMNS}"
        );
        let session = sqlx::query_as::<_, ScoringSession>(&sql)
            .bind(session_id)
            .bind(SessionStatus::Abandoned.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(session)
    }

    /// Hard-delete an abandoned session; ends and arrows go with it.
    /// Completed and in-progress sessions are kept for historical integrity.
    pub async fn delete(&self, session_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let session = Self::find_owned_for_update(&mut *tx, session_id, user_id).await?;
        if session.status != SessionStatus::Abandoned {
            return Err(StorageError::validation(
                "Only abandoned sessions can be deleted",
            ));
        }

        sqlx::query("DELETE FROM scoring_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// All ends for a session, oldest first, each with its arrows.
    pub async fn ends_with_arrows(&self, session_id: Uuid) -> Result<Vec<EndResponse>> {
        let ends_sql = format!(
            "SELECT {END_COLUMNS} FROM ends WHERE session_id = $1 ORDER BY end_number"
        );
        let ends = sqlx::query_as::<_, End>(&ends_sql)
            .bind(session_id)
            .fetch_all(self.pool)
            .await?;

        let arrows_sql = format!(
            "SELECT a.{} FROM arrows a \
             JOIN ends e ON a.end_id = e.end_id \
             WHERE e.session_id = $1 \
             ORDER BY e.end_number, a.arrow_number",
            ARROW_COLUMNS.replace(", ", ", a.")
        );
        let arrows = sqlx::query_as::<_, Arrow>(&arrows_sql)
            .bind(session_id)
            .fetch_all(self.pool)
            .await?;

        let mut by_end: HashMap<Uuid, Vec<Arrow>> = HashMap::new();
        for arrow in arrows {
            by_end.entry(arrow.end_id).or_default().push(arrow);
        }

        Ok(ends
            .into_iter()
            .map(|end| {
                let arrows = by_end.remove(&end.end_id).unwrap_or_default();
                EndResponse::new(end, arrows)
            })
            .collect())
    }

    /// Filtered, newest-first session listing with template and setup names.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &SessionFilter,
    ) -> Result<(Vec<SessionSummary>, i64)> {
        let total_items = self.count_filtered(user_id, filter).await?;

        let mut query = QueryBuilder::new(
            "SELECT s.session_id, s.template_id, t.name AS template_name, sp.name AS setup_profile_name, \
                    s.status, s.total_score, s.total_x_count, s.total_arrows, s.location, \
                    s.started_at, s.completed_at \
             FROM scoring_sessions s \
             JOIN round_templates t ON s.template_id = t.template_id \
             LEFT JOIN setup_profiles sp ON s.setup_profile_id = sp.setup_id \
             WHERE s.user_id = ",
        );
        query.push_bind(user_id);
        Self::push_filters(&mut query, filter);
        query.push(" ORDER BY s.started_at DESC LIMIT ");
        query.push_bind(filter.pagination.limit() as i64);
        query.push(" OFFSET ");
        query.push_bind(filter.pagination.offset() as i64);

        #[derive(FromRow)]
        struct SummaryRow {
            session_id: Uuid,
            template_id: Uuid,
            template_name: String,
            setup_profile_name: Option<String>,
            status: String,
            total_score: i32,
            total_x_count: i32,
            total_arrows: i32,
            location: Option<String>,
            started_at: chrono::DateTime<Utc>,
            completed_at: Option<chrono::DateTime<Utc>>,
        }

        let rows: Vec<SummaryRow> = query.build_query_as().fetch_all(self.pool).await?;

        let summaries = rows
            .into_iter()
            .map(|row| {
                Ok(SessionSummary {
                    session_id: row.session_id,
                    template_id: row.template_id,
                    template_name: row.template_name,
                    setup_profile_name: row.setup_profile_name,
                    status: SessionStatus::try_from(row.status)?,
                    total_score: row.total_score,
                    total_x_count: row.total_x_count,
                    total_arrows: row.total_arrows,
                    location: row.location,
                    started_at: row.started_at,
                    completed_at: row.completed_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((summaries, total_items))
    }

    async fn count_filtered(&self, user_id: Uuid, filter: &SessionFilter) -> Result<i64> {
        let mut query = QueryBuilder::new(
            "SELECT COUNT(*) FROM scoring_sessions s WHERE s.user_id = ",
        );
        query.push_bind(user_id);
        Self::push_filters(&mut query, filter);

        let count = query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    fn push_filters<'q>(query: &mut QueryBuilder<'q, sqlx::Postgres>, filter: &'q SessionFilter) {
        if let Some(template_id) = filter.template_id {
            query.push(" AND s.template_id = ");
            query.push_bind(template_id);
        }
        if let Some(date_from) = filter.date_from {
            query.push(" AND s.started_at >= ");
            query.push_bind(date_from.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
        }
        if let Some(date_to) = filter.date_to {
            query.push(" AND s.started_at < ");
            query.push_bind(
                date_to
                    .succ_opt()
                    .unwrap_or(NaiveDate::MAX)
                    .and_hms_opt(0, 0, 0)
                    .unwrap_or_default()
                    .and_utc(),
            );
        }
        if let Some(ref search) = filter.search {
            let pattern = format!("%{search}%");
            query.push(" AND (s.notes ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR s.location ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
    }

    /// Mint (or return the existing) opaque share token for a session.
    pub async fn create_share_token(&self, session_id: Uuid, user_id: Uuid) -> Result<String> {
        let session = self.find_owned(session_id, user_id).await?;
        if let Some(token) = session.share_token {
            return Ok(token);
        }

        let token = Uuid::new_v4().simple().to_string();
        sqlx::query("UPDATE scoring_sessions SET share_token = $2 WHERE session_id = $1")
            .bind(session_id)
            .bind(&token)
            .execute(self.pool)
            .await?;

        Ok(token)
    }

    pub async fn revoke_share_token(&self, session_id: Uuid, user_id: Uuid) -> Result<()> {
        self.find_owned(session_id, user_id).await?;

        sqlx::query("UPDATE scoring_sessions SET share_token = NULL WHERE session_id = $1")
            .bind(session_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Resolve a share token to its session and the archer's public name.
    pub async fn find_by_share_token(&self, token: &str) -> Result<(ScoringSession, String)> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM scoring_sessions WHERE share_token = $1"
        );
        let session = sqlx::query_as::<_, ScoringSession>(&sql)
            .bind(token)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        let archer_name: String = sqlx::query_scalar(
            "SELECT COALESCE(display_name, username) FROM users WHERE user_id = $1",
        )
        .bind(session.user_id)
        .fetch_one(self.pool)
        .await?;

        Ok((session, archer_name))
    }

    /// Aggregate statistics across a user's sessions.
    pub async fn stats(&self, user_id: Uuid) -> Result<StatsResponse> {
        #[derive(FromRow)]
        struct Totals {
            total_sessions: i64,
            completed_sessions: i64,
            total_arrows: i64,
            total_x_count: i64,
        }

        let totals = sqlx::query_as::<_, Totals>(
            "SELECT COUNT(*) AS total_sessions, \
                    COUNT(*) FILTER (WHERE status = 'completed') AS completed_sessions, \
                    COALESCE(SUM(total_arrows), 0) AS total_arrows, \
                    COALESCE(SUM(total_x_count), 0) AS total_x_count \
             FROM scoring_sessions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        #[derive(FromRow)]
        struct BestRow {
            total_score: i32,
            template_name: String,
        }

        let best = sqlx::query_as::<_, BestRow>(
            "SELECT s.total_score, t.name AS template_name \
             FROM scoring_sessions s \
             JOIN round_templates t ON s.template_id = t.template_id \
             WHERE s.user_id = $1 AND s.status = 'completed' \
             ORDER BY s.total_score DESC \
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        #[derive(FromRow)]
        struct AverageRow {
            template_name: String,
            avg_score: f64,
            count: i64,
        }

        let averages = sqlx::query_as::<_, AverageRow>(
            "SELECT t.name AS template_name, \
                    AVG(s.total_score)::float8 AS avg_score, \
                    COUNT(*) AS count \
             FROM scoring_sessions s \
             JOIN round_templates t ON s.template_id = t.template_id \
             WHERE s.user_id = $1 AND s.status = 'completed' \
             GROUP BY t.name \
             ORDER BY t.name",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        #[derive(FromRow)]
        struct TrendRow {
            session_id: Uuid,
            template_name: String,
            total_score: i32,
            max_score: i64,
            date: chrono::DateTime<Utc>,
        }

        let trend_rows = sqlx::query_as::<_, TrendRow>(
            "SELECT s.session_id, t.name AS template_name, s.total_score, \
                    COALESCE((SELECT SUM(st.num_ends * st.arrows_per_end * st.max_score_per_arrow) \
                              FROM round_stages st WHERE st.template_id = s.template_id), 0) AS max_score, \
                    COALESCE(s.completed_at, s.started_at) AS date \
             FROM scoring_sessions s \
             JOIN round_templates t ON s.template_id = t.template_id \
             WHERE s.user_id = $1 AND s.status = 'completed' \
             ORDER BY s.completed_at DESC \
             LIMIT 10",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let recent_trend = trend_rows
            .into_iter()
            .map(|row| {
                let max_score = row.max_score as i32;
                let percentage = if max_score > 0 {
                    (f64::from(row.total_score) / f64::from(max_score) * 1000.0).round() / 10.0
                } else {
                    0.0
                };
                TrendPoint {
                    session_id: row.session_id,
                    template_name: row.template_name,
                    score: row.total_score,
                    max_score,
                    percentage,
                    date: row.date,
                }
            })
            .collect();

        Ok(StatsResponse {
            total_sessions: totals.total_sessions,
            completed_sessions: totals.completed_sessions,
            total_arrows: totals.total_arrows,
            total_x_count: totals.total_x_count,
            personal_best_score: best.as_ref().map(|b| b.total_score),
            personal_best_template: best.map(|b| b.template_name),
            avg_by_round_type: averages
                .into_iter()
                .map(|row| RoundTypeAverage {
                    template_name: row.template_name,
                    avg_score: (row.avg_score * 10.0).round() / 10.0,
                    count: row.count,
                })
                .collect(),
            recent_trend,
        })
    }
}
