use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Notification;

/// Creates notifications for the external delivery collaborator.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        notification_type: &str,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (user_id, notification_type, title, message, link) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING notification_id, user_id, notification_type, title, message, link, \
                       is_read, created_at",
        )
        .bind(user_id)
        .bind(notification_type)
        .bind(title)
        .bind(message)
        .bind(link)
        .fetch_one(self.pool)
        .await?;

        Ok(notification)
    }
}
