use std::collections::HashMap;
use crate::domain::{
    models::rsvp::{Rsvp, RsvpPlusOne, RsvpWithPlusOnes},
    ports::RsvpRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteRsvpRepo {
    pool: SqlitePool,
}

impl SqliteRsvpRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RsvpRepository for SqliteRsvpRepo {
    async fn create(&self, rsvp: &Rsvp) -> Result<Rsvp, AppError> {
        sqlx::query_as::<_, Rsvp>(
            r#"INSERT INTO rsvps (
                id, event_id, guest_id, token, status, guests_count, dietary_requirements,
                special_needs, message, responded_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&rsvp.id).bind(&rsvp.event_id).bind(&rsvp.guest_id).bind(&rsvp.token)
            .bind(rsvp.status).bind(rsvp.guests_count).bind(&rsvp.dietary_requirements)
            .bind(&rsvp.special_needs).bind(&rsvp.message).bind(rsvp.responded_at)
            .bind(rsvp.created_at).bind(rsvp.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_event_guest(&self, event_id: &str, guest_id: &str) -> Result<Option<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE event_id = ? AND guest_id = ?")
            .bind(event_id)
            .bind(guest_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<RsvpWithPlusOnes>, AppError> {
        let rsvps = sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE event_id = ? ORDER BY created_at ASC")
            .bind(event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;

        let plus_ones = sqlx::query_as::<_, RsvpPlusOne>(
            r#"SELECT p.* FROM rsvp_plus_ones p
               JOIN rsvps r ON r.id = p.rsvp_id
               WHERE r.event_id = ?
               ORDER BY p.created_at ASC"#
        )
            .bind(event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;

        let mut by_rsvp: HashMap<String, Vec<RsvpPlusOne>> = HashMap::new();
        for plus_one in plus_ones {
            by_rsvp.entry(plus_one.rsvp_id.clone()).or_default().push(plus_one);
        }

        Ok(rsvps
            .into_iter()
            .map(|rsvp| {
                let plus_ones = by_rsvp.remove(&rsvp.id).unwrap_or_default();
                RsvpWithPlusOnes { rsvp, plus_ones }
            })
            .collect())
    }

    async fn list_plus_ones(&self, rsvp_id: &str) -> Result<Vec<RsvpPlusOne>, AppError> {
        sqlx::query_as::<_, RsvpPlusOne>("SELECT * FROM rsvp_plus_ones WHERE rsvp_id = ? ORDER BY created_at ASC")
            .bind(rsvp_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, rsvp: &Rsvp) -> Result<Rsvp, AppError> {
        sqlx::query_as::<_, Rsvp>(
            r#"UPDATE rsvps SET
                status=?, guests_count=?, dietary_requirements=?, special_needs=?, message=?,
                responded_at=?, updated_at=?
               WHERE id=? RETURNING *"#
        )
            .bind(rsvp.status).bind(rsvp.guests_count).bind(&rsvp.dietary_requirements)
            .bind(&rsvp.special_needs).bind(&rsvp.message).bind(rsvp.responded_at).bind(rsvp.updated_at)
            .bind(&rsvp.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("RSVP not found".into()))
    }

    async fn respond(&self, rsvp: &Rsvp, plus_ones: &[RsvpPlusOne]) -> Result<RsvpWithPlusOnes, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query_as::<_, Rsvp>(
            r#"UPDATE rsvps SET
                status=?, guests_count=?, dietary_requirements=?, special_needs=?, message=?,
                responded_at=?, updated_at=?
               WHERE id=? RETURNING *"#
        )
            .bind(rsvp.status).bind(rsvp.guests_count).bind(&rsvp.dietary_requirements)
            .bind(&rsvp.special_needs).bind(&rsvp.message).bind(rsvp.responded_at).bind(rsvp.updated_at)
            .bind(&rsvp.id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("RSVP not found".into()))?;

        sqlx::query("DELETE FROM rsvp_plus_ones WHERE rsvp_id = ?")
            .bind(&rsvp.id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        let mut saved = Vec::with_capacity(plus_ones.len());
        for p in plus_ones {
            let row = sqlx::query_as::<_, RsvpPlusOne>(
                r#"INSERT INTO rsvp_plus_ones (id, rsvp_id, first_name, last_name, email, dietary_requirements, age_group, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"#
            )
                .bind(&p.id).bind(&p.rsvp_id).bind(&p.first_name).bind(&p.last_name)
                .bind(&p.email).bind(&p.dietary_requirements).bind(p.age_group).bind(p.created_at)
                .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
            saved.push(row);
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(RsvpWithPlusOnes { rsvp: updated, plus_ones: saved })
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM rsvps WHERE id = ?")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("RSVP not found".into()));
        }
        Ok(())
    }
}
