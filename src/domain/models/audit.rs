use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    StatusChange,
    Send,
}

/// Append-only: the schema rejects UPDATE and DELETE on `audit_logs`.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct AuditLog {
    pub id: String,
    pub user_id: Option<String>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub old_values: Option<Json<Value>>,
    pub new_values: Option<Json<Value>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(user_id: Option<String>, action: AuditAction, entity_type: &str, entity_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            action,
            entity_type: entity_type.to_string(),
            entity_id,
            old_values: None,
            new_values: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub user_id: Option<String>,
    pub action: Option<AuditAction>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
