use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{CreateVenueRequest, UpdateVenueRequest};
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::api::handlers::{managed_event, non_blank, viewable_event};
use crate::domain::models::{audit::AuditAction, venue::EventVenue};
use crate::domain::services::audit_service::AuditEntry;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

fn validate_venue(venue: &EventVenue) -> Result<(), AppError> {
    if venue.name.trim().is_empty() {
        return Err(AppError::Validation("Venue name is required".into()));
    }
    if venue.capacity.is_some_and(|c| c < 0) {
        return Err(AppError::Validation("Capacity cannot be negative".into()));
    }
    if venue.latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
        return Err(AppError::Validation("Latitude must be between -90 and 90".into()));
    }
    if venue.longitude.is_some_and(|lon| !(-180.0..=180.0).contains(&lon)) {
        return Err(AppError::Validation("Longitude must be between -180 and 180".into()));
    }
    Ok(())
}

pub async fn list_venues(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = viewable_event(&state, &user, &event_id).await?;
    Ok(Json(state.venue_repo.list_by_event(&event.id).await?))
}

pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(event_id): Path<String>,
    Json(payload): Json<CreateVenueRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;

    let mut venue = EventVenue::new(event.id.clone(), payload.name.trim().to_string());
    venue.address = non_blank(payload.address);
    venue.city = non_blank(payload.city);
    venue.state = non_blank(payload.state);
    venue.country = non_blank(payload.country);
    venue.postal_code = non_blank(payload.postal_code);
    venue.latitude = payload.latitude;
    venue.longitude = payload.longitude;
    venue.capacity = payload.capacity;
    venue.is_primary = payload.is_primary.unwrap_or(false);
    venue.notes = non_blank(payload.notes);
    validate_venue(&venue)?;

    let created = state.venue_repo.create(&venue).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Create, "venue", Some(&created.id)).after(&created),
        &meta,
    ).await;

    info!("Added venue {} to event {}", created.id, event.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_venue(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, venue_id)): Path<(String, String)>,
    Json(payload): Json<UpdateVenueRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let before = state.venue_repo.find_by_id(&event.id, &venue_id).await?
        .ok_or(AppError::NotFound("Venue not found".into()))?;

    let mut venue = before.clone();
    if let Some(name) = payload.name {
        venue.name = name.trim().to_string();
    }
    if payload.address.is_some() {
        venue.address = non_blank(payload.address);
    }
    if payload.city.is_some() {
        venue.city = non_blank(payload.city);
    }
    if payload.state.is_some() {
        venue.state = non_blank(payload.state);
    }
    if payload.country.is_some() {
        venue.country = non_blank(payload.country);
    }
    if payload.postal_code.is_some() {
        venue.postal_code = non_blank(payload.postal_code);
    }
    if payload.latitude.is_some() {
        venue.latitude = payload.latitude;
    }
    if payload.longitude.is_some() {
        venue.longitude = payload.longitude;
    }
    if payload.capacity.is_some() {
        venue.capacity = payload.capacity;
    }
    if let Some(primary) = payload.is_primary {
        venue.is_primary = primary;
    }
    if payload.notes.is_some() {
        venue.notes = non_blank(payload.notes);
    }
    venue.updated_at = Utc::now();
    validate_venue(&venue)?;

    let updated = state.venue_repo.update(&venue).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Update, "venue", Some(&updated.id))
            .before(&before)
            .after(&updated),
        &meta,
    ).await;

    Ok(Json(updated))
}

pub async fn delete_venue(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((event_id, venue_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let venue = state.venue_repo.find_by_id(&event.id, &venue_id).await?
        .ok_or(AppError::NotFound("Venue not found".into()))?;

    state.venue_repo.delete(&event.id, &venue.id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Delete, "venue", Some(&venue.id)).before(&venue),
        &meta,
    ).await;

    info!("Deleted venue: {}", venue.id);
    Ok(Json(json!({"status": "deleted"})))
}
