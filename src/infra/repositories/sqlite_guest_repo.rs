use crate::domain::{models::guest::{Guest, GuestFilter}, ports::GuestRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteGuestRepo {
    pool: SqlitePool,
}

impl SqliteGuestRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestRepository for SqliteGuestRepo {
    async fn create(&self, guest: &Guest) -> Result<Guest, AppError> {
        sqlx::query_as::<_, Guest>(
            r#"INSERT INTO guests (
                id, first_name, last_name, email, phone, address, city, country, age_group,
                is_vip, notes, tags, custom_fields, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&guest.id).bind(&guest.first_name).bind(&guest.last_name)
            .bind(&guest.email).bind(&guest.phone).bind(&guest.address).bind(&guest.city).bind(&guest.country)
            .bind(guest.age_group).bind(guest.is_vip).bind(&guest.notes)
            .bind(&guest.tags).bind(&guest.custom_fields)
            .bind(&guest.created_by).bind(guest.created_at).bind(guest.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Guest>, AppError> {
        sqlx::query_as::<_, Guest>("SELECT * FROM guests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, filter: &GuestFilter) -> Result<Vec<Guest>, AppError> {
        let search = filter.search.as_deref().map(contains_pattern);

        sqlx::query_as::<_, Guest>(
            r#"SELECT * FROM guests
               WHERE (?1 IS NULL OR first_name LIKE ?1 ESCAPE '\' OR last_name LIKE ?1 ESCAPE '\' OR email LIKE ?1 ESCAPE '\')
                 AND (?2 IS NULL OR EXISTS (SELECT 1 FROM json_each(guests.tags) WHERE json_each.value = ?2))
                 AND (?3 IS NULL OR is_vip = ?3)
               ORDER BY last_name ASC, first_name ASC"#
        )
            .bind(search)
            .bind(&filter.tag)
            .bind(filter.vip)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Guest>, AppError> {
        sqlx::query_as::<_, Guest>(
            r#"SELECT g.* FROM guests g
               JOIN event_guests eg ON eg.guest_id = g.id
               WHERE eg.event_id = ?
               ORDER BY g.last_name ASC, g.first_name ASC"#
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, guest: &Guest) -> Result<Guest, AppError> {
        sqlx::query_as::<_, Guest>(
            r#"UPDATE guests SET
                first_name=?, last_name=?, email=?, phone=?, address=?, city=?, country=?, age_group=?,
                is_vip=?, notes=?, tags=?, custom_fields=?, updated_at=?
               WHERE id=? RETURNING *"#
        )
            .bind(&guest.first_name).bind(&guest.last_name)
            .bind(&guest.email).bind(&guest.phone).bind(&guest.address).bind(&guest.city).bind(&guest.country)
            .bind(guest.age_group).bind(guest.is_vip).bind(&guest.notes)
            .bind(&guest.tags).bind(&guest.custom_fields).bind(guest.updated_at)
            .bind(&guest.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Guest not found".into()))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM guests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Guest not found".into()));
        }
        Ok(())
    }
}

/// `%term%` for `LIKE ... ESCAPE '\'`, with the term's own wildcards matched literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
