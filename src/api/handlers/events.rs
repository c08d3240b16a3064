use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::{
    requests::{CreateEventRequest, EventStatusRequest, UpdateEventRequest},
    responses::EventDetailResponse,
};
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::api::handlers::{managed_event, non_blank, viewable_event};
use crate::domain::models::{
    audit::AuditAction,
    event::{Event, EventStatus, EventType},
    role::RoleName,
};
use crate::domain::services::{audit_service::AuditEntry, lifecycle};
use chrono::Utc;
use chrono_tz::Tz;
use serde_json::json;
use sqlx::types::Json as SqlJson;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const DEFAULT_TIMEZONE: &str = "UTC";

fn validate_event(event: &mut Event) -> Result<(), AppError> {
    if event.name.trim().is_empty() {
        return Err(AppError::Validation("Event name is required".into()));
    }
    if event.timezone.parse::<Tz>().is_err() {
        return Err(AppError::Validation(format!("Invalid timezone '{}'", event.timezone)));
    }
    if event.end_date < event.start_date {
        return Err(AppError::Validation("End date must be after start date".into()));
    }
    if event.max_plus_ones < 0 {
        return Err(AppError::Validation("max_plus_ones cannot be negative".into()));
    }
    if let Some(deadline) = event.rsvp_deadline {
        if deadline > event.end_date {
            return Err(AppError::Validation("RSVP deadline must not be after the event ends".into()));
        }
    }

    if event.is_recurring {
        match &event.recurrence_rule {
            Some(rule) if rule.interval >= 1 => {}
            Some(_) => return Err(AppError::Validation("Recurrence interval must be at least 1".into())),
            None => return Err(AppError::Validation("Recurring events need a recurrence_rule".into())),
        }
    } else {
        event.recurrence_rule = None;
    }
    Ok(())
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::EventHost)?;
    info!("Creating event '{}' for user {}", payload.name, user.id());

    let now = Utc::now();
    let mut event = Event {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        description: non_blank(payload.description),
        event_type: payload.event_type.unwrap_or(EventType::Other),
        start_date: payload.start_date,
        end_date: payload.end_date,
        timezone: payload.timezone.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        status: EventStatus::Draft,
        is_recurring: payload.is_recurring.unwrap_or(false),
        recurrence_rule: payload.recurrence_rule.map(SqlJson),
        is_private: payload.is_private.unwrap_or(false),
        rsvp_deadline: payload.rsvp_deadline,
        allow_plus_ones: payload.allow_plus_ones.unwrap_or(false),
        max_plus_ones: payload.max_plus_ones.unwrap_or(0),
        created_by: user.id().to_string(),
        created_at: now,
        updated_at: now,
    };
    validate_event(&mut event)?;

    let created = state.event_repo.create(&event).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Create, "event", Some(&created.id)).after(&created),
        &meta,
    ).await;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let events = state.event_repo.list(user.event_scope()).await?;
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = viewable_event(&state, &user, &id).await?;
    let venues = state.venue_repo.list_by_event(&event.id).await?;
    Ok(Json(EventDetailResponse { event, venues }))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let before = managed_event(&state, &user, &id).await?;
    if before.status.is_terminal() {
        return Err(AppError::Conflict(format!("Cannot edit a {} event", before.status.as_str())));
    }

    let mut event = before.clone();
    if let Some(name) = payload.name {
        event.name = name.trim().to_string();
    }
    if payload.description.is_some() {
        event.description = non_blank(payload.description);
    }
    if let Some(event_type) = payload.event_type {
        event.event_type = event_type;
    }
    if let Some(start) = payload.start_date {
        event.start_date = start;
    }
    if let Some(end) = payload.end_date {
        event.end_date = end;
    }
    if let Some(tz) = payload.timezone {
        event.timezone = tz;
    }
    if let Some(recurring) = payload.is_recurring {
        event.is_recurring = recurring;
    }
    if let Some(rule) = payload.recurrence_rule {
        event.recurrence_rule = Some(SqlJson(rule));
    }
    if let Some(private) = payload.is_private {
        event.is_private = private;
    }
    if let Some(deadline) = payload.rsvp_deadline {
        event.rsvp_deadline = deadline;
    }
    if let Some(allow) = payload.allow_plus_ones {
        event.allow_plus_ones = allow;
    }
    if let Some(max) = payload.max_plus_ones {
        event.max_plus_ones = max;
    }
    event.updated_at = Utc::now();
    validate_event(&mut event)?;

    let updated = state.event_repo.update(&event).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Update, "event", Some(&updated.id))
            .before(&before)
            .after(&updated),
        &meta,
    ).await;

    info!("Updated event: {}", updated.id);
    Ok(Json(updated))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &id).await?;
    state.event_repo.delete(&event.id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Delete, "event", Some(&event.id)).before(&event),
        &meta,
    ).await;

    info!("Deleted event: {}", event.id);
    Ok(Json(json!({"status": "deleted"})))
}

pub async fn change_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<EventStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let before = managed_event(&state, &user, &id).await?;

    let mut event = before.clone();
    lifecycle::transition_event(&mut event, payload.status)?;
    let updated = state.event_repo.update(&event).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::StatusChange, "event", Some(&updated.id))
            .before(&json!({ "status": before.status }))
            .after(&json!({ "status": updated.status })),
        &meta,
    ).await;

    info!("Event {} moved from {} to {}", updated.id, before.status.as_str(), updated.status.as_str());
    Ok(Json(updated))
}
