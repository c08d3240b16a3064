use axum::{
    extract::FromRequestParts,
    http::{header::USER_AGENT, request::Parts},
};
use crate::domain::services::audit_service::ClientMeta;
use std::convert::Infallible;

/// Caller address and user agent for the audit trail. Never rejects.
pub struct RequestMeta(pub ClientMeta);

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts.headers.get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let ip_address = header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|first| first.trim().to_string()))
            .or_else(|| header("x-real-ip"));

        let user_agent = parts.headers.get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(RequestMeta(ClientMeta { ip_address, user_agent }))
    }
}
