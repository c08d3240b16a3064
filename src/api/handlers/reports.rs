use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::extractors::auth::AuthUser;
use crate::api::handlers::viewable_event;
use crate::domain::services::report_service;
use chrono::Utc;
use std::sync::Arc;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    user.require_permission("reports", "read")?;

    let now = Utc::now();
    let stats = state.report_repo.dashboard_stats(user.event_scope(), now).await?;
    Ok(Json(report_service::build_dashboard(stats, now)))
}

pub async fn event_report(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require_permission("reports", "read")?;
    let event = viewable_event(&state, &user, &event_id).await?;

    let stats = state.report_repo.event_stats(&event.id).await?;
    Ok(Json(report_service::build_event_report(&event, stats, Utc::now())))
}
