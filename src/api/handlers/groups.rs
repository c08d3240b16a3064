use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::{
    requests::{AddMemberRequest, CreateGroupRequest, UpdateGroupRequest},
    responses::GroupDetailResponse,
};
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::api::handlers::{managed_event, non_blank, viewable_event};
use crate::domain::models::{audit::AuditAction, event::Event, group::GuestGroup, role::RoleName};
use crate::domain::services::audit_service::AuditEntry;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

async fn find_group(state: &AppState, event: &Event, group_id: &str) -> Result<GuestGroup, AppError> {
    state.group_repo.find_by_id(&event.id, group_id).await?
        .ok_or(AppError::NotFound("Group not found".into()))
}

pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = viewable_event(&state, &user, &event_id).await?;
    user.require_role(RoleName::Hospitality)?;

    let groups = state.group_repo.list_by_event(&event.id).await?;
    let mut details = Vec::with_capacity(groups.len());
    for group in groups {
        let members = state.group_repo.list_members(&group.id).await?;
        details.push(GroupDetailResponse { group, members });
    }
    Ok(Json(details))
}

pub async fn create_group(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(event_id): Path<String>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Group name is required".into()));
    }

    let group = GuestGroup::new(event.id.clone(), payload.name.trim().to_string(), non_blank(payload.description));
    let created = state.group_repo.create(&group).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Create, "guest_group", Some(&created.id)).after(&created),
        &meta,
    ).await;

    info!("Created group {} for event {}", created.id, event.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_group(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, group_id)): Path<(String, String)>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let before = find_group(&state, &event, &group_id).await?;

    let mut group = before.clone();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Group name is required".into()));
        }
        group.name = name.trim().to_string();
    }
    if payload.description.is_some() {
        group.description = non_blank(payload.description);
    }
    group.updated_at = Utc::now();

    let updated = state.group_repo.update(&group).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Update, "guest_group", Some(&updated.id))
            .before(&before)
            .after(&updated),
        &meta,
    ).await;

    Ok(Json(updated))
}

pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, group_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let group = find_group(&state, &event, &group_id).await?;

    state.group_repo.delete(&event.id, &group.id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Delete, "guest_group", Some(&group.id)).before(&group),
        &meta,
    ).await;

    info!("Deleted group: {}", group.id);
    Ok(Json(json!({"status": "deleted"})))
}

pub async fn list_members(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((event_id, group_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = viewable_event(&state, &user, &event_id).await?;
    user.require_role(RoleName::Hospitality)?;
    let group = find_group(&state, &event, &group_id).await?;
    Ok(Json(state.group_repo.list_members(&group.id).await?))
}

/// Only guests invited to the group's event can join it.
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, group_id)): Path<(String, String)>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let group = find_group(&state, &event, &group_id).await?;

    if state.event_guest_repo.find(&event.id, &payload.guest_id).await?.is_none() {
        return Err(AppError::Validation("Guest is not invited to this event".into()));
    }

    state.group_repo.add_member(&group.id, &payload.guest_id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Create, "guest_group", Some(&group.id))
            .after(&json!({ "member_added": payload.guest_id })),
        &meta,
    ).await;

    let members = state.group_repo.list_members(&group.id).await?;
    Ok((StatusCode::CREATED, Json(GroupDetailResponse { group, members })))
}

pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, group_id, guest_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let group = find_group(&state, &event, &group_id).await?;

    state.group_repo.remove_member(&group.id, &guest_id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Delete, "guest_group", Some(&group.id))
            .before(&json!({ "member_removed": guest_id })),
        &meta,
    ).await;

    Ok(Json(json!({"status": "deleted"})))
}
