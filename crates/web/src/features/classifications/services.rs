use sqlx::PgPool;
use storage::{
    dto::classification::{ClassificationRecordResponse, CurrentClassificationResponse},
    error::Result,
    repository::classification::ClassificationRepository,
};
use uuid::Uuid;

/// Full achievement history, newest first.
pub async fn list_classifications(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ClassificationRecordResponse>> {
    let records = ClassificationRepository::new(pool)
        .list_for_user(user_id)
        .await?;

    Ok(records
        .into_iter()
        .map(ClassificationRecordResponse::from)
        .collect())
}

/// Most recently achieved classification per (system, round_type).
pub async fn current_classifications(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<CurrentClassificationResponse>> {
    ClassificationRepository::new(pool)
        .current_for_user(user_id)
        .await
}
