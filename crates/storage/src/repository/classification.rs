use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::classification::CurrentClassificationResponse;
use crate::error::Result;
use crate::models::ClassificationRecord;

const CLASSIFICATION_COLUMNS: &str = "classification_id, user_id, system, classification, \
     round_type, score, achieved_at, session_id";

pub struct ClassificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ClassificationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Achievement history, newest first. Append-only: the scoring engine
    /// adds a row for every qualifying completion.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ClassificationRecord>> {
        let sql = format!(
            "SELECT {CLASSIFICATION_COLUMNS} FROM classification_records \
             WHERE user_id = $1 \
             ORDER BY achieved_at DESC"
        );
        let records = sqlx::query_as::<_, ClassificationRecord>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(records)
    }

    /// The most recently achieved classification per (system, round_type).
    pub async fn current_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CurrentClassificationResponse>> {
        let records = self.list_for_user(user_id).await?;

        // Records are newest-first, so the first row per key wins.
        let mut best_by_key: HashMap<(String, String), ClassificationRecord> = HashMap::new();
        for record in records {
            let key = (record.system.clone(), record.round_type.clone());
            best_by_key.entry(key).or_insert(record);
        }

        let mut current: Vec<CurrentClassificationResponse> = best_by_key
            .into_values()
            .map(|record| CurrentClassificationResponse {
                system: record.system,
                classification: record.classification,
                round_type: record.round_type,
                score: record.score,
                achieved_at: record.achieved_at,
            })
            .collect();
        current.sort_by(|a, b| (&a.system, &a.round_type).cmp(&(&b.system, &b.round_type)));

        Ok(current)
    }
}
