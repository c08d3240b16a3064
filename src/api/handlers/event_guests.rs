use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{InviteGuestRequest, SeatingRequest};
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::api::handlers::{find_event, managed_event, non_blank, viewable_event};
use crate::domain::models::{
    audit::AuditAction,
    event::Event,
    event_guest::EventGuest,
    role::RoleName,
    rsvp::Rsvp,
};
use crate::domain::services::{access::CurrentUser, audit_service::{self, AuditEntry, ClientMeta}, lifecycle};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

async fn find_event_guest(state: &AppState, event: &Event, guest_id: &str) -> Result<EventGuest, AppError> {
    state.event_guest_repo.find(&event.id, guest_id).await?
        .ok_or(AppError::NotFound("Guest is not invited to this event".into()))
}

pub async fn list_event_guests(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = viewable_event(&state, &user, &event_id).await?;
    user.require_role(RoleName::Hospitality)?;
    Ok(Json(state.event_guest_repo.list_by_event(&event.id).await?))
}

/// Invites a guest and opens their RSVP in the same step.
pub async fn invite_guest(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(event_id): Path<String>,
    Json(payload): Json<InviteGuestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let guest = state.guest_repo.find_by_id(&payload.guest_id).await?
        .ok_or(AppError::NotFound("Guest not found".into()))?;

    if state.event_guest_repo.find(&event.id, &guest.id).await?.is_some() {
        return Err(AppError::Conflict("Guest is already invited to this event".into()));
    }

    let mut event_guest = EventGuest::new(event.id.clone(), guest.id.clone());
    event_guest.table_number = non_blank(payload.table_number);
    event_guest.seat_number = non_blank(payload.seat_number);
    event_guest.notes = non_blank(payload.notes);

    let rsvp = match state.rsvp_repo.find_by_event_guest(&event.id, &guest.id).await? {
        Some(_) => None,
        None => Some(Rsvp::new(event.id.clone(), guest.id.clone())),
    };

    let audit = audit_service::build_log(
        AuditEntry::new(Some(user.id()), AuditAction::Create, "event_guest", Some(&event_guest.id)).after(&event_guest),
        &meta,
    );
    let created = state.event_guest_repo.invite(&event_guest, rsvp.as_ref(), &audit).await?;

    info!("Invited guest {} to event {}", guest.id, event.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn remove_guest(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, guest_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let event_guest = find_event_guest(&state, &event, &guest_id).await?;

    state.event_guest_repo.remove(&event.id, &guest_id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Delete, "event_guest", Some(&event_guest.id)).before(&event_guest),
        &meta,
    ).await;

    info!("Removed guest {} from event {}", guest_id, event.id);
    Ok(Json(json!({"status": "deleted"})))
}

pub async fn update_seating(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, guest_id)): Path<(String, String)>,
    Json(payload): Json<SeatingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let before = find_event_guest(&state, &event, &guest_id).await?;

    let mut event_guest = before.clone();
    event_guest.table_number = non_blank(payload.table_number);
    event_guest.seat_number = non_blank(payload.seat_number);
    event_guest.updated_at = Utc::now();

    let updated = state.event_guest_repo.update(&event_guest).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Update, "event_guest", Some(&updated.id))
            .before(&before)
            .after(&updated),
        &meta,
    ).await;

    Ok(Json(updated))
}

/// Marks the invitation as sent. Delivery itself goes through notifications.
pub async fn send_invitation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, guest_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    apply_transition(&state, &user, &meta, &event, &guest_id, |eg, now| {
        lifecycle::mark_invitation_sent(eg, now);
        Ok(())
    }).await
}

pub async fn confirm_guest(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, guest_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    apply_transition(&state, &user, &meta, &event, &guest_id, |eg, now| {
        lifecycle::confirm(eg, now);
        Ok(())
    }).await
}

pub async fn check_in(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, guest_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_event(&state, &event_id).await?;
    user.ensure_can_check_in(&event)?;
    user.require_permission("checkin", "write")?;
    apply_transition(&state, &user, &meta, &event, &guest_id, lifecycle::check_in).await
}

pub async fn check_out(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, guest_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_event(&state, &event_id).await?;
    user.ensure_can_check_in(&event)?;
    user.require_permission("checkin", "write")?;
    apply_transition(&state, &user, &meta, &event, &guest_id, lifecycle::check_out).await
}

async fn apply_transition<F>(
    state: &AppState,
    user: &CurrentUser,
    meta: &ClientMeta,
    event: &Event,
    guest_id: &str,
    transition: F,
) -> Result<Json<EventGuest>, AppError>
where
    F: FnOnce(&mut EventGuest, DateTime<Utc>) -> Result<(), AppError>,
{
    let before = find_event_guest(state, event, guest_id).await?;
    let mut event_guest = before.clone();
    transition(&mut event_guest, Utc::now())?;

    let updated = state.event_guest_repo.update(&event_guest).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::StatusChange, "event_guest", Some(&updated.id))
            .before(&before)
            .after(&updated),
        meta,
    ).await;

    Ok(Json(updated))
}
