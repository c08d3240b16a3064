use crate::domain::{models::venue::EventVenue, ports::VenueRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};

pub struct SqliteVenueRepo {
    pool: SqlitePool,
}

impl SqliteVenueRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Keeps `venue` the only primary venue of its event.
    async fn clear_other_primaries(tx: &mut Transaction<'_, Sqlite>, venue: &EventVenue) -> Result<(), AppError> {
        if venue.is_primary {
            sqlx::query("UPDATE event_venues SET is_primary = 0 WHERE event_id = ? AND id != ? AND is_primary = 1")
                .bind(&venue.event_id)
                .bind(&venue.id)
                .execute(&mut **tx).await.map_err(AppError::Database)?;
        }
        Ok(())
    }
}

#[async_trait]
impl VenueRepository for SqliteVenueRepo {
    async fn create(&self, venue: &EventVenue) -> Result<EventVenue, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        Self::clear_other_primaries(&mut tx, venue).await?;

        let created = sqlx::query_as::<_, EventVenue>(
            r#"INSERT INTO event_venues (
                id, event_id, name, address, city, state, country, postal_code,
                latitude, longitude, capacity, is_primary, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&venue.id).bind(&venue.event_id).bind(&venue.name)
            .bind(&venue.address).bind(&venue.city).bind(&venue.state).bind(&venue.country).bind(&venue.postal_code)
            .bind(venue.latitude).bind(venue.longitude).bind(venue.capacity)
            .bind(venue.is_primary).bind(&venue.notes).bind(venue.created_at).bind(venue.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<EventVenue>, AppError> {
        sqlx::query_as::<_, EventVenue>("SELECT * FROM event_venues WHERE event_id = ? AND id = ?")
            .bind(event_id)
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventVenue>, AppError> {
        sqlx::query_as::<_, EventVenue>(
            "SELECT * FROM event_venues WHERE event_id = ? ORDER BY is_primary DESC, created_at ASC"
        )
            .bind(event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_primary(&self, event_id: &str) -> Result<Option<EventVenue>, AppError> {
        sqlx::query_as::<_, EventVenue>(
            "SELECT * FROM event_venues WHERE event_id = ? ORDER BY is_primary DESC, created_at ASC LIMIT 1"
        )
            .bind(event_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, venue: &EventVenue) -> Result<EventVenue, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        Self::clear_other_primaries(&mut tx, venue).await?;

        let updated = sqlx::query_as::<_, EventVenue>(
            r#"UPDATE event_venues SET
                name=?, address=?, city=?, state=?, country=?, postal_code=?,
                latitude=?, longitude=?, capacity=?, is_primary=?, notes=?, updated_at=?
               WHERE id=? AND event_id=? RETURNING *"#
        )
            .bind(&venue.name).bind(&venue.address).bind(&venue.city).bind(&venue.state)
            .bind(&venue.country).bind(&venue.postal_code)
            .bind(venue.latitude).bind(venue.longitude).bind(venue.capacity)
            .bind(venue.is_primary).bind(&venue.notes).bind(venue.updated_at)
            .bind(&venue.id).bind(&venue.event_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Venue not found".into()))?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM event_venues WHERE id = ? AND event_id = ?")
            .bind(id)
            .bind(event_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Venue not found".into()));
        }
        Ok(())
    }
}
