use crate::domain::{models::event::{Event, EventScope}, ports::EventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Filter over `events e` for an [`EventScope`] bound as `?1` (kind) and `?2` (owner id).
pub(crate) const EVENT_SCOPE_FILTER: &str =
    "(?1 = 'all' OR (?1 = 'shared' AND e.is_private = 0) OR (?1 = 'owner' AND e.created_by = ?2))";

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, name, description, event_type, start_date, end_date, timezone, status,
                is_recurring, recurrence_rule, is_private, rsvp_deadline, allow_plus_ones, max_plus_ones,
                created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&event.id)
            .bind(&event.name)
            .bind(&event.description)
            .bind(event.event_type)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(&event.timezone)
            .bind(event.status)
            .bind(event.is_recurring)
            .bind(&event.recurrence_rule)
            .bind(event.is_private)
            .bind(event.rsvp_deadline)
            .bind(event.allow_plus_ones)
            .bind(event.max_plus_ones)
            .bind(&event.created_by)
            .bind(event.created_at)
            .bind(event.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, scope: EventScope<'_>) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(&format!("SELECT * FROM events e WHERE {} ORDER BY e.start_date ASC", EVENT_SCOPE_FILTER))
            .bind(scope.kind())
            .bind(scope.owner())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                name=?, description=?, event_type=?, start_date=?, end_date=?, timezone=?, status=?,
                is_recurring=?, recurrence_rule=?, is_private=?, rsvp_deadline=?,
                allow_plus_ones=?, max_plus_ones=?, updated_at=?
               WHERE id=? RETURNING *"#
        )
            .bind(&event.name)
            .bind(&event.description)
            .bind(event.event_type)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(&event.timezone)
            .bind(event.status)
            .bind(event.is_recurring)
            .bind(&event.recurrence_rule)
            .bind(event.is_private)
            .bind(event.rsvp_deadline)
            .bind(event.allow_plus_ones)
            .bind(event.max_plus_ones)
            .bind(event.updated_at)
            .bind(&event.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".into()));
        }
        Ok(())
    }
}
