use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{CreateGuestRequest, UpdateGuestRequest};
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::api::handlers::{non_blank, validate_email};
use crate::domain::models::{
    audit::AuditAction,
    guest::{Guest, GuestFilter},
    role::RoleName,
};
use crate::domain::services::audit_service::AuditEntry;
use chrono::Utc;
use serde_json::json;
use sqlx::types::Json as SqlJson;
use std::sync::Arc;
use tracing::info;

fn validate_guest(guest: &Guest) -> Result<(), AppError> {
    if guest.first_name.trim().is_empty() || guest.last_name.trim().is_empty() {
        return Err(AppError::Validation("First and last name are required".into()));
    }
    if let Some(email) = &guest.email {
        validate_email(email)?;
    }
    if guest.tags.0.iter().any(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("Tags cannot be blank".into()));
    }
    Ok(())
}

async fn find_guest(state: &AppState, id: &str) -> Result<Guest, AppError> {
    state.guest_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Guest not found".into()))
}

pub async fn list_guests(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(filter): Query<GuestFilter>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::Hospitality)?;
    Ok(Json(state.guest_repo.list(&filter).await?))
}

pub async fn create_guest(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<CreateGuestRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::EventHost)?;

    let mut guest = Guest::new(payload.first_name.trim().to_string(), payload.last_name.trim().to_string());
    guest.email = non_blank(payload.email).map(|e| e.to_lowercase());
    guest.phone = non_blank(payload.phone);
    guest.address = non_blank(payload.address);
    guest.city = non_blank(payload.city);
    guest.country = non_blank(payload.country);
    guest.age_group = payload.age_group;
    guest.is_vip = payload.is_vip.unwrap_or(false);
    guest.notes = non_blank(payload.notes);
    guest.tags = SqlJson(payload.tags.unwrap_or_default());
    guest.custom_fields = SqlJson(payload.custom_fields.unwrap_or_default());
    guest.created_by = Some(user.id().to_string());
    validate_guest(&guest)?;

    let created = state.guest_repo.create(&guest).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Create, "guest", Some(&created.id)).after(&created),
        &meta,
    ).await;

    info!("Created guest: {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_guest(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::Hospitality)?;
    Ok(Json(find_guest(&state, &id).await?))
}

pub async fn update_guest(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<UpdateGuestRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::EventHost)?;

    let before = find_guest(&state, &id).await?;
    let mut guest = before.clone();

    if let Some(first) = payload.first_name {
        guest.first_name = first.trim().to_string();
    }
    if let Some(last) = payload.last_name {
        guest.last_name = last.trim().to_string();
    }
    if payload.email.is_some() {
        guest.email = non_blank(payload.email).map(|e| e.to_lowercase());
    }
    if payload.phone.is_some() {
        guest.phone = non_blank(payload.phone);
    }
    if payload.address.is_some() {
        guest.address = non_blank(payload.address);
    }
    if payload.city.is_some() {
        guest.city = non_blank(payload.city);
    }
    if payload.country.is_some() {
        guest.country = non_blank(payload.country);
    }
    if payload.age_group.is_some() {
        guest.age_group = payload.age_group;
    }
    if let Some(vip) = payload.is_vip {
        guest.is_vip = vip;
    }
    if payload.notes.is_some() {
        guest.notes = non_blank(payload.notes);
    }
    if let Some(tags) = payload.tags {
        guest.tags = SqlJson(tags);
    }
    if let Some(fields) = payload.custom_fields {
        guest.custom_fields = SqlJson(fields);
    }
    guest.updated_at = Utc::now();
    validate_guest(&guest)?;

    let updated = state.guest_repo.update(&guest).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Update, "guest", Some(&updated.id))
            .before(&before)
            .after(&updated),
        &meta,
    ).await;

    Ok(Json(updated))
}

pub async fn delete_guest(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require_permission("guests", "delete")?;

    let guest = find_guest(&state, &id).await?;
    state.guest_repo.delete(&guest.id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Delete, "guest", Some(&guest.id)).before(&guest),
        &meta,
    ).await;

    info!("Deleted guest: {}", guest.id);
    Ok(Json(json!({"status": "deleted"})))
}
