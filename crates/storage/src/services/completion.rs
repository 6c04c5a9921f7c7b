//! Session completion: the one place where the scoring engine derives
//! downstream facts.
//!
//! The status transition, personal-record upsert, and classification append
//! are the authoritative scoring facts and commit in one transaction. Feed
//! and notification emission run after commit and are best-effort: a failed
//! emission is logged, never surfaced as a scoring failure.

use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::scoring::CompleteSessionRequest;
use crate::error::{Result, StorageError};
use crate::models::{PersonalRecord, ScoringSession, SessionStatus};
use crate::repository::feed::FeedRepository;
use crate::repository::notification::NotificationRepository;
use crate::repository::session::{SESSION_COLUMNS, SessionRepository};
use crate::services::classification;

pub const FEED_TYPE_PERSONAL_RECORD: &str = "personal_record";
pub const FEED_TYPE_SESSION_COMPLETED: &str = "session_completed";
pub const NOTIFICATION_TYPE_PERSONAL_RECORD: &str = "personal_record";

/// Transition an in-progress session to `completed`, apply any overrides,
/// run the personal-record and classification checks, and emit the feed and
/// notification events. Returns the completed session and whether this
/// completion set a new personal best.
pub async fn complete_session(
    pool: &PgPool,
    session_id: Uuid,
    user_id: Uuid,
    overrides: &CompleteSessionRequest,
) -> Result<(ScoringSession, bool)> {
    let mut tx = pool.begin().await?;

    let session = SessionRepository::find_owned_for_update(&mut *tx, session_id, user_id).await?;
    if !session.status.can_transition_to(SessionStatus::Completed) {
        return Err(StorageError::validation("Session is not in progress"));
    }

    let completed_at = Utc::now();
    let update_sql = format!(
        "UPDATE scoring_sessions \
         SET status = $2, completed_at = $3, \
             notes = COALESCE($4, notes), \
             location = COALESCE($5, location), \
             weather = COALESCE($6, weather) \
         WHERE session_id = $1 \
         RETURNING {SESSION_COLUMNS}"
    );
    let session = sqlx::query_as::<_, ScoringSession>(&update_sql)
        .bind(session_id)
        .bind(SessionStatus::Completed.as_str())
        .bind(completed_at)
        .bind(&overrides.notes)
        .bind(&overrides.location)
        .bind(&overrides.weather)
        .fetch_one(&mut *tx)
        .await?;

    let template_name: Option<String> =
        sqlx::query_scalar("SELECT name FROM round_templates WHERE template_id = $1")
            .bind(session.template_id)
            .fetch_optional(&mut *tx)
            .await?;

    // Personal record: strictly greater scores replace the stored record in
    // place; ties leave the original session as the record holder.
    let existing = sqlx::query_as::<_, PersonalRecord>(
        "SELECT record_id, user_id, template_id, session_id, score, achieved_at \
         FROM personal_records \
         WHERE user_id = $1 AND template_id = $2 FOR UPDATE",
    )
    .bind(user_id)
    .bind(session.template_id)
    .fetch_optional(&mut *tx)
    .await?;

    let is_personal_best =
        beats_existing(session.total_score, existing.as_ref().map(|r| r.score));

    if is_personal_best {
        match existing {
            Some(record) => {
                sqlx::query(
                    "UPDATE personal_records \
                     SET session_id = $2, score = $3, achieved_at = $4 \
                     WHERE record_id = $1",
                )
                .bind(record.record_id)
                .bind(session_id)
                .bind(session.total_score)
                .bind(completed_at)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO personal_records \
                         (user_id, template_id, session_id, score, achieved_at) \
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(user_id)
                .bind(session.template_id)
                .bind(session_id)
                .bind(session.total_score)
                .bind(completed_at)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    // Classification: append-only, keyed by the template's display name.
    if let Some(round_type) = template_name.as_deref()
        && let Some(awarded) = classification::classify(session.total_score, round_type)
    {
        sqlx::query(
            "INSERT INTO classification_records \
                 (user_id, system, classification, round_type, score, achieved_at, session_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user_id)
        .bind(awarded.system)
        .bind(awarded.label)
        .bind(round_type)
        .bind(session.total_score)
        .bind(completed_at)
        .bind(session_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    emit_completion_events(pool, &session, template_name.as_deref(), is_personal_best).await;

    Ok((session, is_personal_best))
}

/// Strictly greater scores set a new record; ties never replace the stored
/// session.
fn beats_existing(new_score: i32, existing_score: Option<i32>) -> bool {
    existing_score.is_none_or(|score| new_score > score)
}

/// Fire-and-forget side effects of a committed completion.
async fn emit_completion_events(
    pool: &PgPool,
    session: &ScoringSession,
    template_name: Option<&str>,
    is_personal_best: bool,
) {
    let display_name = template_name.unwrap_or("Unknown");
    let feed_type = if is_personal_best {
        FEED_TYPE_PERSONAL_RECORD
    } else {
        FEED_TYPE_SESSION_COMPLETED
    };
    let payload = json!({
        "template_name": display_name,
        "total_score": session.total_score,
        "session_id": session.session_id,
    });

    if let Err(err) = FeedRepository::new(pool)
        .emit(session.user_id, feed_type, payload)
        .await
    {
        tracing::warn!(
            session_id = %session.session_id,
            "Failed to emit completion feed item: {err}"
        );
    }

    if is_personal_best {
        let message = format!(
            "You scored {} on {} - a new personal best!",
            session.total_score, display_name
        );
        let link = format!("/sessions/{}", session.session_id);
        if let Err(err) = NotificationRepository::new(pool)
            .create(
                session.user_id,
                NOTIFICATION_TYPE_PERSONAL_RECORD,
                "New Personal Record!",
                &message,
                Some(&link),
            )
            .await
        {
            tracing::warn!(
                session_id = %session.session_id,
                "Failed to create personal record notification: {err}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_completion_is_always_a_record() {
        assert!(beats_existing(0, None));
        assert!(beats_existing(300, None));
    }

    #[test]
    fn test_higher_score_beats_existing() {
        assert!(beats_existing(280, Some(279)));
    }

    #[test]
    fn test_tie_does_not_replace_record() {
        assert!(!beats_existing(280, Some(280)));
    }

    #[test]
    fn test_lower_score_does_not_replace_record() {
        assert!(!beats_existing(250, Some(280)));
    }
}
