use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::dto::scoring::PersonalRecordResponse;
use crate::error::Result;
use crate::models::PersonalRecord;

const RECORD_COLUMNS: &str = "record_id, user_id, template_id, session_id, score, achieved_at";

pub struct PersonalRecordRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PersonalRecordRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_for_template(
        &self,
        user_id: Uuid,
        template_id: Uuid,
    ) -> Result<Option<PersonalRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM personal_records \
             WHERE user_id = $1 AND template_id = $2"
        );
        let record = sqlx::query_as::<_, PersonalRecord>(&sql)
            .bind(user_id)
            .bind(template_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(record)
    }

    /// Whether the given session currently holds the record for its template.
    pub async fn is_record_session(&self, user_id: Uuid, session_id: Uuid) -> Result<bool> {
        let held: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM personal_records WHERE user_id = $1 AND session_id = $2",
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(held.is_some())
    }

    /// All records for a user, with each template's name and maximum score.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PersonalRecordResponse>> {
        #[derive(FromRow)]
        struct RecordRow {
            template_id: Uuid,
            template_name: String,
            score: i32,
            max_score: i64,
            session_id: Uuid,
            achieved_at: chrono::DateTime<chrono::Utc>,
        }

        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT pr.template_id, t.name AS template_name, pr.score, \
                    COALESCE((SELECT SUM(st.num_ends * st.arrows_per_end * st.max_score_per_arrow) \
                              FROM round_stages st WHERE st.template_id = pr.template_id), 0) AS max_score, \
                    pr.session_id, pr.achieved_at \
             FROM personal_records pr \
             JOIN round_templates t ON pr.template_id = t.template_id \
             WHERE pr.user_id = $1 \
             ORDER BY t.name",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PersonalRecordResponse {
                template_id: row.template_id,
                template_name: row.template_name,
                score: row.score,
                max_score: row.max_score as i32,
                session_id: row.session_id,
                achieved_at: row.achieved_at,
            })
            .collect())
    }
}
