use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{
    CreateNotificationRequest, CreateTemplateRequest, NotificationListQuery, RecipientStatusRequest,
    SendNotificationQuery, UpdateTemplateRequest,
};
use crate::api::extractors::{auth::AuthUser, client_meta::RequestMeta};
use crate::api::handlers::{managed_event, non_blank};
use crate::domain::models::{
    audit::AuditAction,
    notification::{Channel, DeliveryStatus, Notification, NotificationDetail, NotificationStatus, NotificationTemplate},
    role::RoleName,
};
use crate::domain::services::{
    access::CurrentUser,
    audit_service::AuditEntry,
    lifecycle,
    notification_service::{build_context, render, TemplateData},
};
use crate::config::Config;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Rejects templates that do not render against the standard context.
fn check_template(subject: &str, body: &str, config: &Config) -> Result<(), AppError> {
    if subject.trim().is_empty() || body.trim().is_empty() {
        return Err(AppError::Validation("Subject and body are required".into()));
    }
    let context = build_context(&TemplateData { guest: None, event: None, venue: None, rsvp: None }, config);
    render(subject, &context, false)?;
    render(body, &context, true)?;
    Ok(())
}

async fn find_template(state: &AppState, id: &str) -> Result<NotificationTemplate, AppError> {
    state.notification_repo.get_template(id).await?
        .ok_or(AppError::NotFound("Template not found".into()))
}

/// Managers see every notification, everyone else only their own.
async fn find_notification(state: &AppState, user: &CurrentUser, id: &str) -> Result<Notification, AppError> {
    state.notification_repo.find_by_id(id).await?
        .filter(|n| user.sees_all_events() || n.created_by.as_deref() == Some(user.id()))
        .ok_or(AppError::NotFound("Notification not found".into()))
}

// Templates

pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::EventHost)?;
    Ok(Json(state.notification_repo.list_templates().await?))
}

pub async fn create_template(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<CreateTemplateRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::EventManager)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Template name is required".into()));
    }
    check_template(&payload.subject, &payload.body, &state.config)?;

    let mut template = NotificationTemplate::new(
        payload.name.trim().to_string(),
        payload.channel.unwrap_or(Channel::Email),
        payload.subject,
        payload.body,
    );
    template.description = non_blank(payload.description);

    let created = state.notification_repo.create_template(&template).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Create, "notification_template", Some(&created.id)).after(&created),
        &meta,
    ).await;

    info!("Created notification template '{}'", created.name);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_template(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::EventManager)?;

    let before = find_template(&state, &id).await?;
    let mut template = before.clone();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Template name is required".into()));
        }
        template.name = name.trim().to_string();
    }
    if let Some(channel) = payload.channel {
        template.channel = channel;
    }
    if let Some(subject) = payload.subject {
        template.subject = subject;
    }
    if let Some(body) = payload.body {
        template.body = body;
    }
    if payload.description.is_some() {
        template.description = non_blank(payload.description);
    }
    check_template(&template.subject, &template.body, &state.config)?;
    template.updated_at = Utc::now();

    let updated = state.notification_repo.update_template(&template).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Update, "notification_template", Some(&updated.id))
            .before(&before)
            .after(&updated),
        &meta,
    ).await;

    Ok(Json(updated))
}

pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::EventManager)?;

    let template = find_template(&state, &id).await?;
    state.notification_repo.delete_template(&template.id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Delete, "notification_template", Some(&template.id)).before(&template),
        &meta,
    ).await;

    info!("Deleted notification template '{}'", template.name);
    Ok(Json(json!({"status": "deleted"})))
}

// Notifications

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::EventHost)?;

    let notifications: Vec<Notification> = state.notification_repo.list(query.event_id.as_deref()).await?
        .into_iter()
        .filter(|n| user.sees_all_events() || n.created_by.as_deref() == Some(user.id()))
        .collect();
    Ok(Json(notifications))
}

/// Creates a draft and snapshots its recipients. Missing subject, body or channel come from the template.
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_permission("notifications", "write")?;

    let event = match &payload.event_id {
        Some(id) => Some(managed_event(&state, &user, id).await?),
        None => None,
    };
    let template = match &payload.template_id {
        Some(id) => Some(find_template(&state, id).await?),
        None => None,
    };

    let channel = payload.channel
        .or(template.as_ref().map(|t| t.channel))
        .unwrap_or(Channel::Email);
    let subject = payload.subject
        .or(template.as_ref().map(|t| t.subject.clone()))
        .ok_or(AppError::Validation("subject is required without a template".into()))?;
    let body = payload.body
        .or(template.as_ref().map(|t| t.body.clone()))
        .ok_or(AppError::Validation("body is required without a template".into()))?;
    check_template(&subject, &body, &state.config)?;

    let mut notification = Notification::new(
        event.as_ref().map(|e| e.id.clone()),
        channel,
        subject,
        body,
        Some(user.id().to_string()),
    );
    notification.template_id = template.map(|t| t.id);

    let recipients = state.notification_service.resolve_recipients(
        &notification.id,
        channel,
        notification.event_id.as_deref(),
        payload.guest_ids.as_deref(),
    ).await?;
    if recipients.is_empty() {
        return Err(AppError::Validation(format!("No recipients with an address for the {} channel", channel.as_str())));
    }

    let created = state.notification_repo.create(&notification, &recipients).await?;
    let recipients = state.notification_repo.list_recipients(&created.id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Create, "notification", Some(&created.id)).after(&created),
        &meta,
    ).await;

    info!("Created notification {} with {} recipients", created.id, recipients.len());
    Ok((StatusCode::CREATED, Json(NotificationDetail { notification: created, recipients })))
}

pub async fn get_notification(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(RoleName::EventHost)?;

    let notification = find_notification(&state, &user, &id).await?;
    let recipients = state.notification_repo.list_recipients(&notification.id).await?;
    Ok(Json(NotificationDetail { notification, recipients }))
}

pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require_permission("notifications", "write")?;

    let notification = find_notification(&state, &user, &id).await?;
    if notification.status == NotificationStatus::Sending {
        return Err(AppError::Conflict("Notification is being sent".into()));
    }
    state.notification_repo.delete(&notification.id).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Delete, "notification", Some(&notification.id)).before(&notification),
        &meta,
    ).await;

    info!("Deleted notification: {}", notification.id);
    Ok(Json(json!({"status": "deleted"})))
}

/// Queues the notification for the dispatcher. A failed notification is retried for its failed recipients
/// and for any left in `sending` by an interrupted run.
pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path(id): Path<String>,
    Query(query): Query<SendNotificationQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require_permission("notifications", "send")?;

    let notification = find_notification(&state, &user, &id).await?;
    match notification.status {
        NotificationStatus::Sending => return Err(AppError::Conflict("Notification is being sent".into())),
        NotificationStatus::Sent => return Err(AppError::Conflict("Notification was already sent".into())),
        NotificationStatus::Failed => {
            let now = Utc::now();
            for mut recipient in state.notification_repo.list_recipients(&notification.id).await? {
                if recipient.status == DeliveryStatus::Failed {
                    lifecycle::transition_recipient(&mut recipient, DeliveryStatus::Pending, None, now)?;
                    state.notification_repo.update_recipient(&recipient).await?;
                }
            }
        }
        NotificationStatus::Draft | NotificationStatus::Scheduled => {}
    }

    let at = query.scheduled_at.unwrap_or_else(Utc::now);
    let scheduled = state.notification_repo.schedule(&notification.id, at).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::Send, "notification", Some(&scheduled.id))
            .before(&json!({ "status": notification.status }))
            .after(&json!({ "status": scheduled.status, "scheduled_at": scheduled.scheduled_at })),
        &meta,
    ).await;

    info!("Notification {} scheduled for {}", scheduled.id, at);
    Ok(Json(scheduled))
}

/// Records a delivery receipt reported by the channel provider.
pub async fn update_recipient_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RequestMeta(meta): RequestMeta,
    Path((id, recipient_id)): Path<(String, String)>,
    Json(payload): Json<RecipientStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_permission("notifications", "write")?;

    let notification = find_notification(&state, &user, &id).await?;
    let before = state.notification_repo.find_recipient(&notification.id, &recipient_id).await?
        .ok_or(AppError::NotFound("Recipient not found".into()))?;

    let mut recipient = before.clone();
    lifecycle::transition_recipient(&mut recipient, payload.status, non_blank(payload.error_message), Utc::now())?;
    let updated = state.notification_repo.update_recipient(&recipient).await?;

    state.audit_service.record(
        AuditEntry::new(Some(user.id()), AuditAction::StatusChange, "notification_recipient", Some(&updated.id))
            .before(&json!({ "status": before.status }))
            .after(&json!({ "status": updated.status, "error_message": updated.error_message })),
        &meta,
    ).await;

    Ok(Json(updated))
}
