use axum::{extract::{Query, State}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::{audit::AuditFilter, role::RoleName};
use std::sync::Arc;

pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(filter): Query<AuditFilter>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::Admin)?;
    Ok(Json(state.audit_service.list(filter).await?))
}
