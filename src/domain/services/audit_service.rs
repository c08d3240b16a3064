use std::sync::Arc;
use crate::domain::{
    models::audit::{AuditAction, AuditFilter, AuditLog},
    ports::AuditRepository,
};
use crate::error::AppError;
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use tracing::{debug, error};

pub const DEFAULT_LOG_LIMIT: i64 = 100;
pub const MAX_LOG_LIMIT: i64 = 500;

/// Where a request came from, copied onto every audit row it produces.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One audit entry before it is written.
pub struct AuditEntry<'a> {
    pub actor: Option<&'a str>,
    pub action: AuditAction,
    pub entity_type: &'a str,
    pub entity_id: Option<&'a str>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
}

impl<'a> AuditEntry<'a> {
    pub fn new(actor: Option<&'a str>, action: AuditAction, entity_type: &'a str, entity_id: Option<&'a str>) -> Self {
        Self { actor, action, entity_type, entity_id, old_values: None, new_values: None }
    }

    pub fn before<T: Serialize>(mut self, value: &T) -> Self {
        self.old_values = snapshot(value);
        self
    }

    pub fn after<T: Serialize>(mut self, value: &T) -> Self {
        self.new_values = snapshot(value);
        self
    }
}

pub struct AuditService {
    repo: Arc<dyn AuditRepository>,
}

impl AuditService {
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }

    /// Appends the entry once its mutation has committed. A failed write is logged with the
    /// full entry rather than turning a saved change into an error response.
    pub async fn record(&self, entry: AuditEntry<'_>, meta: &ClientMeta) {
        let log = build_log(entry, meta);
        debug!(action = ?log.action, entity_type = %log.entity_type, entity_id = ?log.entity_id, "audit");

        if let Err(e) = self.repo.append(&log).await {
            error!(
                error = %e,
                audit_id = %log.id,
                user_id = ?log.user_id,
                action = ?log.action,
                entity_type = %log.entity_type,
                entity_id = ?log.entity_id,
                old_values = ?log.old_values.as_ref().map(|v| &v.0),
                new_values = ?log.new_values.as_ref().map(|v| &v.0),
                "Failed to write audit log"
            );
        }
    }

    pub async fn list(&self, mut filter: AuditFilter) -> Result<Vec<AuditLog>, AppError> {
        filter.limit = Some(filter.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT));
        filter.offset = Some(filter.offset.unwrap_or(0).max(0));
        self.repo.list(&filter).await
    }
}

/// Turns an entry into the row to store, for writers that append it inside their own transaction.
pub fn build_log(entry: AuditEntry<'_>, meta: &ClientMeta) -> AuditLog {
    let mut log = AuditLog::new(
        entry.actor.map(str::to_string),
        entry.action,
        entry.entity_type,
        entry.entity_id.map(str::to_string),
    );
    log.old_values = entry.old_values.map(Json);
    log.new_values = entry.new_values.map(Json);
    log.ip_address = meta.ip_address.clone();
    log.user_agent = meta.user_agent.clone();
    log
}

/// Serializes an entity for the audit trail. Secrets are excluded by the models' serde attributes.
pub fn snapshot<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}
