use crate::domain::{models::setting::Setting, ports::SettingsRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{types::Json, SqlitePool};

pub struct SqliteSettingsRepo {
    pool: SqlitePool,
}

impl SqliteSettingsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepo {
    async fn list(&self) -> Result<Vec<Setting>, AppError> {
        sqlx::query_as::<_, Setting>("SELECT * FROM settings ORDER BY key ASC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn get(&self, key: &str) -> Result<Option<Setting>, AppError> {
        sqlx::query_as::<_, Setting>("SELECT * FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn upsert(&self, key: &str, value: &Value, updated_by: Option<&str>) -> Result<Setting, AppError> {
        sqlx::query_as::<_, Setting>(
            r#"INSERT INTO settings (key, value, updated_by, updated_at) VALUES (?, ?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value, updated_by = excluded.updated_by, updated_at = excluded.updated_at
               RETURNING *"#
        )
            .bind(key)
            .bind(Json(value))
            .bind(updated_by)
            .bind(Utc::now())
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
}
