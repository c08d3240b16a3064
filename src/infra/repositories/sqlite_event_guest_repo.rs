use crate::domain::{
    models::{audit::AuditLog, event_guest::{EventGuest, EventGuestView}, rsvp::Rsvp},
    ports::EventGuestRepository,
};
use crate::error::AppError;
use crate::infra::repositories::sqlite_audit_repo::insert_audit_log;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteEventGuestRepo {
    pool: SqlitePool,
}

impl SqliteEventGuestRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventGuestRepository for SqliteEventGuestRepo {
    async fn invite(&self, event_guest: &EventGuest, rsvp: Option<&Rsvp>, audit: &AuditLog) -> Result<EventGuest, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, EventGuest>(
            r#"INSERT INTO event_guests (
                id, event_id, guest_id, invitation_sent, invitation_sent_at, confirmed, confirmed_at,
                table_number, seat_number, checked_in_at, checked_out_at, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&event_guest.id).bind(&event_guest.event_id).bind(&event_guest.guest_id)
            .bind(event_guest.invitation_sent).bind(event_guest.invitation_sent_at)
            .bind(event_guest.confirmed).bind(event_guest.confirmed_at)
            .bind(&event_guest.table_number).bind(&event_guest.seat_number)
            .bind(event_guest.checked_in_at).bind(event_guest.checked_out_at)
            .bind(&event_guest.notes).bind(event_guest.created_at).bind(event_guest.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        if let Some(rsvp) = rsvp {
            sqlx::query(
                "INSERT INTO rsvps (id, event_id, guest_id, token, status, guests_count, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
            )
                .bind(&rsvp.id).bind(&rsvp.event_id).bind(&rsvp.guest_id).bind(&rsvp.token)
                .bind(rsvp.status).bind(rsvp.guests_count).bind(rsvp.created_at).bind(rsvp.updated_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        insert_audit_log(&mut *tx, audit).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find(&self, event_id: &str, guest_id: &str) -> Result<Option<EventGuest>, AppError> {
        sqlx::query_as::<_, EventGuest>("SELECT * FROM event_guests WHERE event_id = ? AND guest_id = ?")
            .bind(event_id)
            .bind(guest_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventGuestView>, AppError> {
        sqlx::query_as::<_, EventGuestView>(
            r#"SELECT eg.*, g.first_name, g.last_name, g.email, g.phone, g.is_vip, g.age_group,
                      r.status AS rsvp_status
               FROM event_guests eg
               JOIN guests g ON g.id = eg.guest_id
               LEFT JOIN rsvps r ON r.event_id = eg.event_id AND r.guest_id = eg.guest_id
               WHERE eg.event_id = ?
               ORDER BY g.last_name ASC, g.first_name ASC"#
        )
            .bind(event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, event_guest: &EventGuest) -> Result<EventGuest, AppError> {
        sqlx::query_as::<_, EventGuest>(
            r#"UPDATE event_guests SET
                invitation_sent=?, invitation_sent_at=?, confirmed=?, confirmed_at=?,
                table_number=?, seat_number=?, checked_in_at=?, checked_out_at=?, notes=?, updated_at=?
               WHERE id=? RETURNING *"#
        )
            .bind(event_guest.invitation_sent).bind(event_guest.invitation_sent_at)
            .bind(event_guest.confirmed).bind(event_guest.confirmed_at)
            .bind(&event_guest.table_number).bind(&event_guest.seat_number)
            .bind(event_guest.checked_in_at).bind(event_guest.checked_out_at)
            .bind(&event_guest.notes).bind(event_guest.updated_at)
            .bind(&event_guest.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Guest is not invited to this event".into()))
    }

    /// Uninviting also drops the guest's RSVP and group memberships for the event.
    async fn remove(&self, event_id: &str, guest_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let result = sqlx::query("DELETE FROM event_guests WHERE event_id = ? AND guest_id = ?")
            .bind(event_id).bind(guest_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Guest is not invited to this event".into()));
        }

        sqlx::query("DELETE FROM rsvps WHERE event_id = ? AND guest_id = ?")
            .bind(event_id).bind(guest_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        sqlx::query(
            "DELETE FROM guest_group_members WHERE guest_id = ? AND group_id IN (SELECT id FROM guest_groups WHERE event_id = ?)"
        )
            .bind(guest_id).bind(event_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}
