use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{CreateUserRequest, SetRolesRequest, UpdateUserRequest};
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::api::handlers::{non_blank, validate_account, validate_email};
use crate::domain::models::{audit::AuditAction, auth::UserProfile, role::RoleName, user::User};
use crate::domain::services::{audit_service::AuditEntry, password};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

async fn profile(state: &AppState, user: User) -> Result<UserProfile, AppError> {
    let roles = state.role_repo.roles_for_user(&user.id).await?
        .iter()
        .map(|r| r.name)
        .collect();
    Ok(UserProfile { user, roles })
}

async fn find_user(state: &AppState, id: &str) -> Result<User, AppError> {
    state.user_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("User not found".into()))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(current): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(RoleName::Admin)?;

    let users = state.user_repo.list().await?;
    let mut profiles = Vec::with_capacity(users.len());
    for user in users {
        profiles.push(profile(&state, user).await?);
    }
    Ok(Json(profiles))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AuthUser(current): AuthUser,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(RoleName::Admin)?;
    validate_account(&payload.username, &payload.email)?;
    password::validate_password(&payload.password)?;

    let mut user = User::new(
        payload.username.trim().to_string(),
        payload.email.trim().to_lowercase(),
        password::hash_password(&payload.password)?,
    );
    user.first_name = non_blank(payload.first_name);
    user.last_name = non_blank(payload.last_name);
    user.phone = non_blank(payload.phone);

    let user = state.user_repo.create(&user).await?;

    let requested = payload.roles.filter(|r| !r.is_empty()).unwrap_or_else(|| vec![RoleName::Guest]);
    let roles: Vec<RoleName> = state.role_repo.set_user_roles(&user.id, &requested).await?
        .iter()
        .map(|r| r.name)
        .collect();

    let created = UserProfile { user, roles };
    state.audit_service.record(
        AuditEntry::new(Some(current.id()), AuditAction::Create, "user", Some(&created.user.id)).after(&created),
        &meta,
    ).await;

    info!("User {} created by {}", created.user.id, current.id());

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AuthUser(current): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(RoleName::Admin)?;
    let user = find_user(&state, &id).await?;
    Ok(Json(profile(&state, user).await?))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AuthUser(current): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(RoleName::Admin)?;

    let before = find_user(&state, &id).await?;
    let mut user = before.clone();

    if let Some(username) = payload.username {
        validate_account(&username, &user.email)?;
        user.username = username.trim().to_string();
    }
    if let Some(email) = payload.email {
        validate_email(&email)?;
        user.email = email.trim().to_lowercase();
    }
    if payload.first_name.is_some() {
        user.first_name = non_blank(payload.first_name);
    }
    if payload.last_name.is_some() {
        user.last_name = non_blank(payload.last_name);
    }
    if payload.phone.is_some() {
        user.phone = non_blank(payload.phone);
    }
    if payload.avatar_url.is_some() {
        user.avatar_url = non_blank(payload.avatar_url);
    }

    let password_changed = match payload.password {
        Some(new_password) => {
            password::validate_password(&new_password)?;
            user.password_hash = password::hash_password(&new_password)?;
            true
        }
        None => false,
    };
    user.updated_at = Utc::now();

    let user = state.user_repo.update(&user).await?;
    if password_changed {
        state.auth_service.revoke_all(&user.id).await?;
    }

    state.audit_service.record(
        AuditEntry::new(Some(current.id()), AuditAction::Update, "user", Some(&user.id))
            .before(&before)
            .after(&user),
        &meta,
    ).await;

    info!("Updated user: {}", user.id);
    Ok(Json(profile(&state, user).await?))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AuthUser(current): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(RoleName::Admin)?;
    if id == current.id() {
        return Err(AppError::Validation("You cannot delete your own account".into()));
    }

    let user = find_user(&state, &id).await?;
    state.user_repo.delete(&user.id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(current.id()), AuditAction::Delete, "user", Some(&user.id)).before(&user),
        &meta,
    ).await;

    info!("Deleted user: {}", user.id);
    Ok(Json(json!({"status": "deleted"})))
}

pub async fn set_roles(
    State(state): State<Arc<AppState>>,
    AuthUser(current): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<SetRolesRequest>,
) -> Result<impl IntoResponse, AppError> {
    current.require_role(RoleName::Admin)?;
    if payload.roles.is_empty() {
        return Err(AppError::Validation("At least one role is required".into()));
    }

    let user = find_user(&state, &id).await?;
    let before = profile(&state, user.clone()).await?;

    let roles: Vec<RoleName> = state.role_repo.set_user_roles(&user.id, &payload.roles).await?
        .iter()
        .map(|r| r.name)
        .collect();
    let after = UserProfile { user, roles };

    state.audit_service.record(
        AuditEntry::new(Some(current.id()), AuditAction::Update, "user", Some(&after.user.id))
            .before(&before.roles)
            .after(&after.roles),
        &meta,
    ).await;

    info!("Roles of user {} set to {:?}", after.user.id, after.roles);
    Ok(Json(after))
}

pub async fn activate_user(
    state: State<Arc<AppState>>,
    user: AuthUser,
    meta: RequestMeta,
    id: Path<String>,
) -> Result<impl IntoResponse, AppError> {
    set_active(state, user, meta, id, true).await
}

pub async fn deactivate_user(
    state: State<Arc<AppState>>,
    user: AuthUser,
    meta: RequestMeta,
    id: Path<String>,
) -> Result<impl IntoResponse, AppError> {
    set_active(state, user, meta, id, false).await
}

async fn set_active(
    State(state): State<Arc<AppState>>,
    AuthUser(current): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
    active: bool,
) -> Result<Json<UserProfile>, AppError> {
    current.require_role(RoleName::Admin)?;
    if !active && id == current.id() {
        return Err(AppError::Validation("You cannot deactivate your own account".into()));
    }

    let before = find_user(&state, &id).await?;
    let mut user = before.clone();
    user.is_active = active;
    user.updated_at = Utc::now();
    let user = state.user_repo.update(&user).await?;

    if !active {
        state.auth_service.revoke_all(&user.id).await?;
    }

    state.audit_service.record(
        AuditEntry::new(Some(current.id()), AuditAction::StatusChange, "user", Some(&user.id))
            .before(&json!({ "is_active": before.is_active }))
            .after(&json!({ "is_active": user.is_active })),
        &meta,
    ).await;

    info!("User {} active={}", user.id, active);
    Ok(Json(profile(&state, user).await?))
}
