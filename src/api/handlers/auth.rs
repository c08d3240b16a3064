use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::{
    requests::{
        ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
        ResetPasswordRequest, UpdateProfileRequest,
    },
    responses::MessageResponse,
};
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::api::handlers::{non_blank, validate_account, validate_email};
use crate::domain::models::{
    audit::AuditAction,
    auth::{AuthResponse, UserProfile},
    role::RoleName,
    user::User,
};
use crate::domain::services::{
    audit_service::AuditEntry,
    auth_service::{hash_token, random_token},
    defaults, notification_service, password,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tera::Context;
use tracing::{info, warn};

const RESET_TOKEN_LENGTH: usize = 32;
const RESET_TOKEN_TTL_HOURS: i64 = 1;

pub async fn register(
    State(state): State<Arc<AppState>>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state.config.allow_registration {
        return Err(AppError::Forbidden("Registration is disabled".into()));
    }

    validate_account(&payload.username, &payload.email)?;
    password::validate_password(&payload.password)?;

    let mut user = User::new(
        payload.username.trim().to_string(),
        payload.email.trim().to_lowercase(),
        password::hash_password(&payload.password)?,
    );
    user.first_name = non_blank(payload.first_name);
    user.last_name = non_blank(payload.last_name);

    let user = state.user_repo.create(&user).await?;
    let roles: Vec<RoleName> = state.role_repo.set_user_roles(&user.id, &[RoleName::Guest]).await?
        .iter()
        .map(|r| r.name)
        .collect();

    let tokens = state.auth_service.login(&user, &roles).await?;

    state.audit_service.record(
        AuditEntry::new(Some(&user.id), AuditAction::Create, "user", Some(&user.id)).after(&user),
        &meta,
    ).await;

    info!("User registered: {}", user.id);

    Ok((StatusCode::CREATED, Json(AuthResponse::new(tokens, UserProfile { user, roles }))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = state.user_repo.find_by_login(payload.login.trim()).await?
        .ok_or(AppError::Unauthorized)?;

    if !password::verify_password(&payload.password, &user.password_hash)? || !user.is_active {
        return Err(AppError::Unauthorized);
    }

    let roles: Vec<RoleName> = state.role_repo.roles_for_user(&user.id).await?
        .iter()
        .map(|r| r.name)
        .collect();

    user.last_login_at = Some(Utc::now());
    let user = state.user_repo.update(&user).await?;

    let tokens = state.auth_service.login(&user, &roles).await?;

    state.audit_service.record(
        AuditEntry::new(Some(&user.id), AuditAction::Login, "user", Some(&user.id)),
        &meta,
    ).await;

    info!("User logged in: {}", user.id);

    Ok(Json(AuthResponse::new(tokens, UserProfile { user, roles })))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.auth_service.redeem_refresh_token(&payload.refresh_token).await?;

    let user = state.user_repo.find_by_id(&record.user_id).await?
        .filter(|u| u.is_active)
        .ok_or(AppError::Unauthorized)?;

    let roles: Vec<RoleName> = state.role_repo.roles_for_user(&user.id).await?
        .iter()
        .map(|r| r.name)
        .collect();

    let tokens = state.auth_service.rotate(&record, &user, &roles).await?;

    info!("Token refreshed for user: {}", user.id);

    Ok(Json(AuthResponse::new(tokens, UserProfile { user, roles })))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(record) = state.auth_service.logout(&payload.refresh_token).await? {
        state.audit_service.record(
            AuditEntry::new(Some(&record.user_id), AuditAction::Logout, "user", Some(&record.user_id)),
            &meta,
        ).await;
        info!("User logged out: {}", record.user_id);
    }

    Ok(Json(MessageResponse::new("Logged out")))
}

pub async fn me(AuthUser(current): AuthUser) -> Result<impl IntoResponse, AppError> {
    let roles = current.role_names();
    Ok(Json(UserProfile { user: current.user, roles }))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(current): AuthUser,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let before = current.user.clone();
    let mut user = current.user.clone();

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
    user.updated_at = Utc::now();

    let user = state.user_repo.update(&user).await?;

    state.audit_service.record(
        AuditEntry::new(Some(&user.id), AuditAction::Update, "user", Some(&user.id))
            .before(&before)
            .after(&user),
        &meta,
    ).await;

    Ok(Json(UserProfile { user, roles: current.role_names() }))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(current): AuthUser,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !password::verify_password(&payload.current_password, &current.user.password_hash)? {
        return Err(AppError::Validation("Current password is incorrect".into()));
    }
    password::validate_password(&payload.new_password)?;

    let mut user = current.user;
    user.password_hash = password::hash_password(&payload.new_password)?;
    user.updated_at = Utc::now();
    let user = state.user_repo.update(&user).await?;

    state.auth_service.revoke_all(&user.id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(&user.id), AuditAction::Update, "user", Some(&user.id)),
        &meta,
    ).await;

    info!("Password changed for user: {}", user.id);

    Ok(Json(MessageResponse::new("Password changed")))
}

/// Always answers the same way so the endpoint does not reveal which accounts exist.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_login(&payload.email.trim().to_lowercase()).await?
        .filter(|u| u.is_active);

    if let Some(mut user) = user {
        let token = random_token(RESET_TOKEN_LENGTH);
        user.reset_password_token = Some(hash_token(&token));
        user.reset_password_expires = Some(Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS));
        let user = state.user_repo.update(&user).await?;

        let mut ctx = Context::new();
        ctx.insert("name", &user.display_name());
        ctx.insert("token", &token);
        ctx.insert("reset_link", &state.config.reset_link(&token));

        let template = defaults::get_default_template("password_reset").unwrap_or_default();
        let body = notification_service::render(template, &ctx, true)?;

        if let Err(e) = state.email_service
            .send(&user.email, defaults::PASSWORD_RESET_SUBJECT, &body, None, None)
            .await
        {
            warn!("Password reset email to user {} failed: {}", user.id, e);
        } else {
            info!("Password reset requested for user: {}", user.id);
        }
    }

    Ok(Json(MessageResponse::new("If the account exists, a reset link has been sent")))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::Validation("Invalid or expired reset token".into());

    let mut user = state.user_repo.find_by_reset_token(&hash_token(payload.token.trim())).await?
        .ok_or_else(invalid)?;

    if user.reset_password_expires.map_or(true, |expires| expires < Utc::now()) {
        return Err(invalid());
    }
    password::validate_password(&payload.new_password)?;

    user.password_hash = password::hash_password(&payload.new_password)?;
    user.reset_password_token = None;
    user.reset_password_expires = None;
    user.updated_at = Utc::now();
    let user = state.user_repo.update(&user).await?;

    state.audit_service.record(
        AuditEntry::new(Some(&user.id), AuditAction::Update, "user", Some(&user.id)),
        &meta,
    ).await;

    info!("Password reset for user: {}", user.id);

    Ok(Json(MessageResponse::new("Password has been reset")))
}
