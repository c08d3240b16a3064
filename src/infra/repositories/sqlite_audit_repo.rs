use crate::domain::{models::audit::{AuditFilter, AuditLog}, ports::AuditRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool};

pub struct SqliteAuditRepo {
    pool: SqlitePool,
}

impl SqliteAuditRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Writes one audit row on any executor, so repositories can append it inside their own transaction.
pub(crate) async fn insert_audit_log<'e, E>(executor: E, log: &AuditLog) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"INSERT INTO audit_logs (
            id, user_id, action, entity_type, entity_id, old_values, new_values, ip_address, user_agent, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
    )
        .bind(&log.id)
        .bind(&log.user_id)
        .bind(log.action)
        .bind(&log.entity_type)
        .bind(&log.entity_id)
        .bind(&log.old_values)
        .bind(&log.new_values)
        .bind(&log.ip_address)
        .bind(&log.user_agent)
        .bind(log.created_at)
        .execute(executor)
        .await
        .map_err(AppError::Database)?;
    Ok(())
}

#[async_trait]
impl AuditRepository for SqliteAuditRepo {
    async fn append(&self, log: &AuditLog) -> Result<(), AppError> {
        insert_audit_log(&self.pool, log).await
    }

    async fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditLog>, AppError> {
        sqlx::query_as::<_, AuditLog>(
            r#"SELECT * FROM audit_logs
               WHERE (?1 IS NULL OR entity_type = ?1)
                 AND (?2 IS NULL OR entity_id = ?2)
                 AND (?3 IS NULL OR user_id = ?3)
                 AND (?4 IS NULL OR action = ?4)
               ORDER BY created_at DESC, rowid DESC
               LIMIT ?5 OFFSET ?6"#
        )
            .bind(&filter.entity_type)
            .bind(&filter.entity_id)
            .bind(&filter.user_id)
            .bind(filter.action)
            .bind(filter.limit.unwrap_or(100))
            .bind(filter.offset.unwrap_or(0))
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
