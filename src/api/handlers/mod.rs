pub mod audit;
pub mod auth;
pub mod event_guests;
pub mod events;
pub mod groups;
pub mod guests;
pub mod health;
pub mod notifications;
pub mod reports;
pub mod roles;
pub mod rsvps;
pub mod settings;
pub mod users;
pub mod venues;

use crate::domain::{models::event::Event, services::access::CurrentUser};
use crate::error::AppError;
use crate::state::AppState;

pub(crate) async fn find_event(state: &AppState, id: &str) -> Result<Event, AppError> {
    state.event_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Event not found".into()))
}

/// Loads an event the caller may see; hidden events are reported as missing.
pub(crate) async fn viewable_event(state: &AppState, user: &CurrentUser, id: &str) -> Result<Event, AppError> {
    let event = find_event(state, id).await?;
    user.ensure_can_view(&event)?;
    Ok(event)
}

/// Loads an event the caller may change.
pub(crate) async fn managed_event(state: &AppState, user: &CurrentUser, id: &str) -> Result<Event, AppError> {
    let event = viewable_event(state, user, id).await?;
    user.ensure_can_manage(&event)?;
    Ok(event)
}

pub(crate) fn validate_account(username: &str, email: &str) -> Result<(), AppError> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".into()));
    }
    validate_email(email)
}

pub(crate) fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::Validation(format!("Invalid email address '{}'", email))),
    }
}

/// Treats blank optional strings as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
