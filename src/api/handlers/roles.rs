use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::UpdatePermissionsRequest;
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::domain::models::{audit::AuditAction, role::RoleName};
use crate::domain::services::audit_service::AuditEntry;
use chrono::Utc;
use sqlx::types::Json as SqlJson;
use std::sync::Arc;
use tracing::info;

pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.role_repo.list().await?))
}

pub async fn update_permissions(
    State(state): State<Arc<AppState>>,
    AuthUser(current): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePermissionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(RoleName::Admin)?;

    let before = state.role_repo.find_by_id(&id).await?
        .ok_or(AppError::NotFound("Role not found".into()))?;

    if payload.permissions.keys().any(|k| k.trim().is_empty()) {
        return Err(AppError::Validation("Permission resources cannot be blank".into()));
    }

    let mut role = before.clone();
    role.permissions = SqlJson(payload.permissions);
    role.updated_at = Utc::now();
    let role = state.role_repo.update_permissions(&role).await?;

    state.audit_service.record(
        AuditEntry::new(Some(current.id()), AuditAction::Update, "role", Some(&role.id))
            .before(&before.permissions)
            .after(&role.permissions),
        &meta,
    ).await;

    info!("Permissions of role {} updated", role.name);
    Ok(Json(role))
}
