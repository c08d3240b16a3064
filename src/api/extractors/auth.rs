use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use crate::state::AppState;
use crate::domain::services::access::CurrentUser;
use crate::error::AppError;
use std::sync::Arc;
use tracing::Span;

/// The caller behind `Authorization: Bearer <jwt>`, reloaded from the database on every request.
pub struct AuthUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts.headers.get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = app_state.auth_service.verify_access_token(token)?;

        let user = app_state.user_repo.find_by_id(&claims.sub).await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthorized)?;

        let roles = app_state.role_repo.roles_for_user(&user.id).await?;

        Span::current().record("user_id", user.id.as_str());

        Ok(AuthUser(CurrentUser::new(user, roles)))
    }
}
