use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::{
    requests::{CreateRsvpRequest, UpdateRsvpRequest},
    responses::{PublicEventView, PublicRsvpResponse},
};
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::api::handlers::{find_event, managed_event, non_blank, viewable_event};
use crate::domain::models::{
    audit::AuditAction,
    role::RoleName,
    rsvp::{Rsvp, RsvpResponse, RsvpStatus, RsvpWithPlusOnes},
};
use crate::domain::services::{audit_service::AuditEntry, lifecycle};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

async fn find_rsvp(state: &AppState, id: &str) -> Result<Rsvp, AppError> {
    state.rsvp_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("RSVP not found".into()))
}

async fn find_by_token(state: &AppState, token: &str) -> Result<Rsvp, AppError> {
    state.rsvp_repo.find_by_token(token).await?
        .ok_or(AppError::NotFound("RSVP not found".into()))
}

pub async fn list_event_rsvps(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = viewable_event(&state, &user, &event_id).await?;
    user.require_role(RoleName::Hospitality)?;
    Ok(Json(state.rsvp_repo.list_by_event(&event.id).await?))
}

pub async fn create_rsvp(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(event_id): Path<String>,
    Json(payload): Json<CreateRsvpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;

    if state.event_guest_repo.find(&event.id, &payload.guest_id).await?.is_none() {
        return Err(AppError::Validation("Guest is not invited to this event".into()));
    }
    if state.rsvp_repo.find_by_event_guest(&event.id, &payload.guest_id).await?.is_some() {
        return Err(AppError::Conflict("An RSVP already exists for this guest".into()));
    }

    let created = state.rsvp_repo.create(&Rsvp::new(event.id.clone(), payload.guest_id)).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Create, "rsvp", Some(&created.id)).after(&created),
        &meta,
    ).await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Staff correction of an RSVP. Not bound by the deadline.
pub async fn update_rsvp(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRsvpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let before = find_rsvp(&state, &id).await?;
    managed_event(&state, &user, &before.event_id).await?;

    let now = Utc::now();
    let mut rsvp = before.clone();
    if let Some(status) = payload.status {
        if status != rsvp.status {
            rsvp.responded_at = match status {
                RsvpStatus::Pending => None,
                _ => Some(now),
            };
        }
        rsvp.status = status;
    }
    if let Some(count) = payload.guests_count {
        rsvp.guests_count = count;
    }
    if payload.dietary_requirements.is_some() {
        rsvp.dietary_requirements = non_blank(payload.dietary_requirements);
    }
    if payload.special_needs.is_some() {
        rsvp.special_needs = non_blank(payload.special_needs);
    }
    if payload.message.is_some() {
        rsvp.message = non_blank(payload.message);
    }

    if rsvp.guests_count < 0 {
        return Err(AppError::Validation("guests_count cannot be negative".into()));
    }
    if rsvp.status == RsvpStatus::Attending && rsvp.guests_count < 1 {
        return Err(AppError::Validation("Attending requires guests_count of at least 1".into()));
    }
    rsvp.updated_at = now;

    let updated = if rsvp.status == RsvpStatus::Attending {
        let saved = state.rsvp_repo.update(&rsvp).await?;
        let plus_ones = state.rsvp_repo.list_plus_ones(&saved.id).await?;
        RsvpWithPlusOnes { rsvp: saved, plus_ones }
    } else {
        state.rsvp_repo.respond(&rsvp, &[]).await?
    };

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Update, "rsvp", Some(&updated.rsvp.id))
            .before(&before)
            .after(&updated),
        &meta,
    ).await;

    Ok(Json(updated))
}

pub async fn delete_rsvp(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rsvp = find_rsvp(&state, &id).await?;
    managed_event(&state, &user, &rsvp.event_id).await?;

    state.rsvp_repo.delete(&rsvp.id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Delete, "rsvp", Some(&rsvp.id)).before(&rsvp),
        &meta,
    ).await;

    info!("Deleted RSVP: {}", rsvp.id);
    Ok(Json(json!({"status": "deleted"})))
}

/// What the holder of an RSVP link sees. The token is the only credential.
pub async fn get_public_rsvp(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rsvp = find_by_token(&state, &token).await?;
    let event = find_event(&state, &rsvp.event_id).await?;
    let guest = state.guest_repo.find_by_id(&rsvp.guest_id).await?
        .ok_or(AppError::NotFound("RSVP not found".into()))?;
    let venue = state.venue_repo.find_primary(&event.id).await?;
    let plus_ones = state.rsvp_repo.list_plus_ones(&rsvp.id).await?;

    Ok(Json(PublicRsvpResponse {
        open: !event.rsvp_closed(Utc::now()),
        event: PublicEventView::from(&event),
        guest_first_name: guest.first_name,
        guest_last_name: guest.last_name,
        venue,
        rsvp: RsvpWithPlusOnes { rsvp, plus_ones },
    }))
}

pub async fn respond_public_rsvp(
    State(state): State<Arc<AppState>>,
    RequestMeta(meta): RequestMeta,
    Path(token): Path<String>,
    Json(payload): Json<RsvpResponse>,
) -> Result<impl IntoResponse, AppError> {
    let before = find_by_token(&state, &token).await?;
    let event = find_event(&state, &before.event_id).await?;

    let mut rsvp = before.clone();
    let plus_ones = lifecycle::apply_rsvp_response(&event, &mut rsvp, payload, Utc::now())?;
    let saved = state.rsvp_repo.respond(&rsvp, &plus_ones).await?;

    state.audit_service.record(
        AuditEntry::new(None, AuditAction::Update, "rsvp", Some(&saved.rsvp.id))
            .before(&before)
            .after(&saved),
        &meta,
    ).await;

    info!("RSVP {} answered {}", saved.rsvp.id, saved.rsvp.status.as_str());
    Ok(Json(saved))
}
