use axum::{
    body::Body,
    extract::Request,
    http::{header::{AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method},
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{
    audit, auth, event_guests, events, groups, guests, health, notifications, reports, roles, rsvps, settings,
    users, venues,
};
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me).put(auth::update_me))
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password))

        // Users & Roles
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/{id}", get(users::get_user).put(users::update_user).delete(users::delete_user))
        .route("/api/users/{id}/roles", put(users::set_roles))
        .route("/api/users/{id}/activate", post(users::activate_user))
        .route("/api/users/{id}/deactivate", post(users::deactivate_user))
        .route("/api/roles", get(roles::list_roles))
        .route("/api/roles/{id}/permissions", put(roles::update_permissions))

        // Events & Venues
        .route("/api/events", get(events::list_events).post(events::create_event))
        .route("/api/events/{id}", get(events::get_event).put(events::update_event).delete(events::delete_event))
        .route("/api/events/{id}/status", post(events::change_status))
        .route("/api/events/{id}/venues", get(venues::list_venues).post(venues::create_venue))
        .route("/api/events/{id}/venues/{venue_id}", put(venues::update_venue).delete(venues::delete_venue))

        // Guests
        .route("/api/guests", get(guests::list_guests).post(guests::create_guest))
        .route("/api/guests/{id}", get(guests::get_guest).put(guests::update_guest).delete(guests::delete_guest))

        // Event Guests
        .route("/api/events/{id}/guests", get(event_guests::list_event_guests).post(event_guests::invite_guest))
        .route("/api/events/{id}/guests/{guest_id}", delete(event_guests::remove_guest))
        .route("/api/events/{id}/guests/{guest_id}/send-invitation", post(event_guests::send_invitation))
        .route("/api/events/{id}/guests/{guest_id}/confirm", post(event_guests::confirm_guest))
        .route("/api/events/{id}/guests/{guest_id}/check-in", post(event_guests::check_in))
        .route("/api/events/{id}/guests/{guest_id}/check-out", post(event_guests::check_out))
        .route("/api/events/{id}/guests/{guest_id}/seating", put(event_guests::update_seating))

        // Groups
        .route("/api/events/{id}/groups", get(groups::list_groups).post(groups::create_group))
        .route("/api/events/{id}/groups/{group_id}", put(groups::update_group).delete(groups::delete_group))
        .route("/api/events/{id}/groups/{group_id}/members", get(groups::list_members).post(groups::add_member))
        .route("/api/events/{id}/groups/{group_id}/members/{guest_id}", delete(groups::remove_member))

        // RSVPs
        .route("/api/events/{id}/rsvps", get(rsvps::list_event_rsvps).post(rsvps::create_rsvp))
        .route("/api/rsvps/{id}", put(rsvps::update_rsvp).delete(rsvps::delete_rsvp))

        // Public RSVP Flow
        .route("/api/rsvp/{token}", get(rsvps::get_public_rsvp).post(rsvps::respond_public_rsvp))

        // Notifications
        .route("/api/notification-templates", get(notifications::list_templates).post(notifications::create_template))
        .route("/api/notification-templates/{id}", put(notifications::update_template).delete(notifications::delete_template))
        .route("/api/notifications", get(notifications::list_notifications).post(notifications::create_notification))
        .route("/api/notifications/{id}", get(notifications::get_notification).delete(notifications::delete_notification))
        .route("/api/notifications/{id}/send", post(notifications::send_notification))
        .route("/api/notifications/{id}/recipients/{recipient_id}/status", post(notifications::update_recipient_status))

        // Reports
        .route("/api/dashboard", get(reports::dashboard))
        .route("/api/events/{id}/report", get(reports::event_report))

        // Settings & Logs
        .route("/api/settings", get(settings::list_settings))
        .route("/api/settings/{key}", put(settings::put_setting))
        .route("/api/logs", get(audit::list_logs))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(cors)
        .with_state(state)
}

/// Lets the configured frontend call the API with bearer tokens.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
