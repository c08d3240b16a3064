use crate::domain::{models::role::{Role, RoleName}, ports::RoleRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteRoleRepo {
    pool: SqlitePool,
}

impl SqliteRoleRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for SqliteRoleRepo {
    async fn list(&self) -> Result<Vec<Role>, AppError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Role>, AppError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<Role>, AppError> {
        sqlx::query_as::<_, Role>(
            "SELECT r.* FROM roles r JOIN user_roles ur ON ur.role_id = r.id WHERE ur.user_id = ? ORDER BY r.name ASC"
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn set_user_roles(&self, user_id: &str, roles: &[RoleName]) -> Result<Vec<Role>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        let now = Utc::now();
        for role in roles {
            sqlx::query(
                "INSERT OR IGNORE INTO user_roles (user_id, role_id, created_at) SELECT ?, id, ? FROM roles WHERE name = ?"
            )
                .bind(user_id)
                .bind(now)
                .bind(role)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        self.roles_for_user(user_id).await
    }

    async fn update_permissions(&self, role: &Role) -> Result<Role, AppError> {
        sqlx::query_as::<_, Role>("UPDATE roles SET permissions = ?, updated_at = ? WHERE id = ? RETURNING *")
            .bind(&role.permissions)
            .bind(role.updated_at)
            .bind(&role.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Role not found".into()))
    }
}
