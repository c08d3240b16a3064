use crate::domain::{models::{group::GuestGroup, guest::Guest}, ports::GroupRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteGroupRepo {
    pool: SqlitePool,
}

impl SqliteGroupRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for SqliteGroupRepo {
    async fn create(&self, group: &GuestGroup) -> Result<GuestGroup, AppError> {
        sqlx::query_as::<_, GuestGroup>(
            "INSERT INTO guest_groups (id, event_id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&group.id)
            .bind(&group.event_id)
            .bind(&group.name)
            .bind(&group.description)
            .bind(group.created_at)
            .bind(group.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<GuestGroup>, AppError> {
        sqlx::query_as::<_, GuestGroup>("SELECT * FROM guest_groups WHERE event_id = ? AND id = ?")
            .bind(event_id)
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<GuestGroup>, AppError> {
        sqlx::query_as::<_, GuestGroup>("SELECT * FROM guest_groups WHERE event_id = ? ORDER BY name ASC")
            .bind(event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, group: &GuestGroup) -> Result<GuestGroup, AppError> {
        sqlx::query_as::<_, GuestGroup>(
            "UPDATE guest_groups SET name=?, description=?, updated_at=? WHERE id=? AND event_id=? RETURNING *"
        )
            .bind(&group.name)
            .bind(&group.description)
            .bind(group.updated_at)
            .bind(&group.id)
            .bind(&group.event_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Group not found".into()))
    }

    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM guest_groups WHERE id = ? AND event_id = ?")
            .bind(id)
            .bind(event_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Group not found".into()));
        }
        Ok(())
    }

    async fn add_member(&self, group_id: &str, guest_id: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO guest_group_members (group_id, guest_id, created_at) VALUES (?, ?, ?)")
            .bind(group_id)
            .bind(guest_id)
            .bind(Utc::now())
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn remove_member(&self, group_id: &str, guest_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM guest_group_members WHERE group_id = ? AND guest_id = ?")
            .bind(group_id)
            .bind(guest_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Guest is not a member of this group".into()));
        }
        Ok(())
    }

    async fn list_members(&self, group_id: &str) -> Result<Vec<Guest>, AppError> {
        sqlx::query_as::<_, Guest>(
            r#"SELECT g.* FROM guests g
               JOIN guest_group_members m ON m.guest_id = g.id
               WHERE m.group_id = ?
               ORDER BY g.last_name ASC, g.first_name ASC"#
        )
            .bind(group_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
