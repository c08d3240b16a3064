use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::SettingValueRequest;
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::domain::models::{audit::AuditAction, role::RoleName};
use crate::domain::services::audit_service::AuditEntry;
use std::sync::Arc;
use tracing::info;

const MAX_KEY_LENGTH: usize = 100;

pub async fn list_settings(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.settings_repo.list().await?))
}

pub async fn put_setting(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(key): Path<String>,
    Json(payload): Json<SettingValueRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::Admin)?;

    let key = key.trim();
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(AppError::Validation(format!("Setting keys must be 1 to {} characters", MAX_KEY_LENGTH)));
    }

    let before = state.settings_repo.get(key).await?;
    let setting = state.settings_repo.upsert(key, &payload.value, Some(user.id())).await?;

    let action = if before.is_some() { AuditAction::Update } else { AuditAction::Create };
    let mut entry = AuditEntry::new(Some(user.id()), action, "setting", Some(key)).after(&setting.value);
    if let Some(previous) = &before {
        entry = entry.before(&previous.value);
    }
    state.audit_service.record(entry, &meta).await;

    info!("Setting '{}' updated by {}", key, user.id());
    Ok(Json(setting))
}
