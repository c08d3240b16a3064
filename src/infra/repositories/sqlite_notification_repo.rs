use crate::domain::{
    models::notification::{Notification, NotificationRecipient, NotificationStatus, NotificationTemplate},
    ports::NotificationRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteNotificationRepo {
    pool: SqlitePool,
}

impl SqliteNotificationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepo {
    async fn create_template(&self, template: &NotificationTemplate) -> Result<NotificationTemplate, AppError> {
        sqlx::query_as::<_, NotificationTemplate>(
            "INSERT INTO notification_templates (id, name, channel, subject, body, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&template.id).bind(&template.name).bind(template.channel)
            .bind(&template.subject).bind(&template.body).bind(&template.description)
            .bind(template.created_at).bind(template.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn get_template(&self, id: &str) -> Result<Option<NotificationTemplate>, AppError> {
        sqlx::query_as::<_, NotificationTemplate>("SELECT * FROM notification_templates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_template_by_name(&self, name: &str) -> Result<Option<NotificationTemplate>, AppError> {
        sqlx::query_as::<_, NotificationTemplate>("SELECT * FROM notification_templates WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_templates(&self) -> Result<Vec<NotificationTemplate>, AppError> {
        sqlx::query_as::<_, NotificationTemplate>("SELECT * FROM notification_templates ORDER BY name ASC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_template(&self, template: &NotificationTemplate) -> Result<NotificationTemplate, AppError> {
        sqlx::query_as::<_, NotificationTemplate>(
            "UPDATE notification_templates SET name=?, channel=?, subject=?, body=?, description=?, updated_at=? WHERE id=? RETURNING *"
        )
            .bind(&template.name).bind(template.channel).bind(&template.subject)
            .bind(&template.body).bind(&template.description).bind(template.updated_at)
            .bind(&template.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Template not found".into()))
    }

    async fn delete_template(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM notification_templates WHERE id = ?")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Template not found".into()));
        }
        Ok(())
    }

    async fn create(&self, notification: &Notification, recipients: &[NotificationRecipient]) -> Result<Notification, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Notification>(
            r#"INSERT INTO notifications (
                id, event_id, template_id, channel, subject, body, status, scheduled_at, sent_at,
                created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&notification.id).bind(&notification.event_id).bind(&notification.template_id)
            .bind(notification.channel).bind(&notification.subject).bind(&notification.body)
            .bind(notification.status).bind(notification.scheduled_at).bind(notification.sent_at)
            .bind(&notification.created_by).bind(notification.created_at).bind(notification.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        for r in recipients {
            sqlx::query(
                r#"INSERT INTO notification_recipients (id, notification_id, guest_id, address, status, created_at, updated_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?)"#
            )
                .bind(&r.id).bind(&r.notification_id).bind(&r.guest_id).bind(&r.address)
                .bind(r.status).bind(r.created_at).bind(r.updated_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>, AppError> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, event_id: Option<&str>) -> Result<Vec<Notification>, AppError> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE (?1 IS NULL OR event_id = ?1) ORDER BY created_at DESC"
        )
            .bind(event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn schedule(&self, id: &str, at: DateTime<Utc>) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET status = 'scheduled', scheduled_at = ?, updated_at = ? WHERE id = ? RETURNING *"
        )
            .bind(at)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Notification not found".into()))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification not found".into()));
        }
        Ok(())
    }

    async fn claim_due(&self, now: DateTime<Utc>, limit: i32) -> Result<Vec<Notification>, AppError> {
        // Single statement, so two dispatchers can never claim the same row.
        sqlx::query_as::<_, Notification>(
            r#"UPDATE notifications SET status = 'sending', updated_at = ?1
               WHERE id IN (
                   SELECT id FROM notifications
                   WHERE status = 'scheduled' AND (scheduled_at IS NULL OR scheduled_at <= ?1)
                   ORDER BY scheduled_at ASC
                   LIMIT ?2
               )
               RETURNING *"#
        )
            .bind(now)
            .bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn finish(&self, id: &str, status: NotificationStatus, sent_at: Option<DateTime<Utc>>) -> Result<(), AppError> {
        sqlx::query("UPDATE notifications SET status = ?, sent_at = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(sent_at)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn requeue_interrupted(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("UPDATE notification_recipients SET status = 'pending', updated_at = ? WHERE status = 'sending'")
            .bind(now)
            .execute(&mut *tx).await.map_err(AppError::Database)?;
        let requeued = sqlx::query("UPDATE notifications SET status = 'scheduled', updated_at = ? WHERE status = 'sending'")
            .bind(now)
            .execute(&mut *tx).await.map_err(AppError::Database)?
            .rows_affected();

        tx.commit().await.map_err(AppError::Database)?;
        Ok(requeued)
    }

    async fn list_recipients(&self, notification_id: &str) -> Result<Vec<NotificationRecipient>, AppError> {
        sqlx::query_as::<_, NotificationRecipient>(
            "SELECT * FROM notification_recipients WHERE notification_id = ? ORDER BY created_at ASC"
        )
            .bind(notification_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_recipient(&self, notification_id: &str, id: &str) -> Result<Option<NotificationRecipient>, AppError> {
        sqlx::query_as::<_, NotificationRecipient>(
            "SELECT * FROM notification_recipients WHERE notification_id = ? AND id = ?"
        )
            .bind(notification_id)
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_recipient(&self, recipient: &NotificationRecipient) -> Result<NotificationRecipient, AppError> {
        sqlx::query_as::<_, NotificationRecipient>(
            r#"UPDATE notification_recipients SET
                status=?, error_message=?, sent_at=?, delivered_at=?, read_at=?, updated_at=?
               WHERE id=? RETURNING *"#
        )
            .bind(recipient.status).bind(&recipient.error_message)
            .bind(recipient.sent_at).bind(recipient.delivered_at).bind(recipient.read_at)
            .bind(recipient.updated_at)
            .bind(&recipient.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Recipient not found".into()))
    }
}
