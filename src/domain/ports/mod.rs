use crate::domain::models::{
    audit::{AuditFilter, AuditLog},
    auth::RefreshTokenRecord,
    event::{Event, EventScope},
    event_guest::{EventGuest, EventGuestView},
    group::GuestGroup,
    guest::{Guest, GuestFilter},
    notification::{Notification, NotificationRecipient, NotificationStatus, NotificationTemplate},
    report::{DashboardStats, EventStats},
    role::{Role, RoleName},
    rsvp::{Rsvp, RsvpPlusOne, RsvpWithPlusOnes},
    setting::Setting,
    user::User,
    venue::EventVenue,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    /// Looks a user up by username or email.
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError>;
    async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<User>, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn update(&self, user: &User) -> Result<User, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Role>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Role>, AppError>;
    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<Role>, AppError>;
    /// Replaces the user's role set.
    async fn set_user_roles(&self, user_id: &str, roles: &[RoleName]) -> Result<Vec<Role>, AppError>;
    async fn update_permissions(&self, role: &Role) -> Result<Role, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn store_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    /// Deletes and returns the token in one statement, so it can be redeemed once.
    async fn take_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn revoke_family(&self, family_id: Uuid) -> Result<u64, AppError>;
    async fn revoke_user(&self, user_id: &str) -> Result<u64, AppError>;
    async fn purge_expired(&self, user_id: &str, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError>;
    /// Events inside the caller's scope, earliest first.
    async fn list(&self, scope: EventScope<'_>) -> Result<Vec<Event>, AppError>;
    async fn update(&self, event: &Event) -> Result<Event, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn create(&self, venue: &EventVenue) -> Result<EventVenue, AppError>;
    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<EventVenue>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventVenue>, AppError>;
    async fn find_primary(&self, event_id: &str) -> Result<Option<EventVenue>, AppError>;
    async fn update(&self, venue: &EventVenue) -> Result<EventVenue, AppError>;
    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait GuestRepository: Send + Sync {
    async fn create(&self, guest: &Guest) -> Result<Guest, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Guest>, AppError>;
    async fn list(&self, filter: &GuestFilter) -> Result<Vec<Guest>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Guest>, AppError>;
    async fn update(&self, guest: &Guest) -> Result<Guest, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait EventGuestRepository: Send + Sync {
    /// Inserts the invitation, its RSVP when given, and the audit row in one transaction.
    async fn invite(&self, event_guest: &EventGuest, rsvp: Option<&Rsvp>, audit: &AuditLog) -> Result<EventGuest, AppError>;
    async fn find(&self, event_id: &str, guest_id: &str) -> Result<Option<EventGuest>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventGuestView>, AppError>;
    async fn update(&self, event_guest: &EventGuest) -> Result<EventGuest, AppError>;
    async fn remove(&self, event_id: &str, guest_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn create(&self, group: &GuestGroup) -> Result<GuestGroup, AppError>;
    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<GuestGroup>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<GuestGroup>, AppError>;
    async fn update(&self, group: &GuestGroup) -> Result<GuestGroup, AppError>;
    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError>;
    async fn add_member(&self, group_id: &str, guest_id: &str) -> Result<(), AppError>;
    async fn remove_member(&self, group_id: &str, guest_id: &str) -> Result<(), AppError>;
    async fn list_members(&self, group_id: &str) -> Result<Vec<Guest>, AppError>;
}

#[async_trait]
pub trait RsvpRepository: Send + Sync {
    async fn create(&self, rsvp: &Rsvp) -> Result<Rsvp, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Rsvp>, AppError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<Rsvp>, AppError>;
    async fn find_by_event_guest(&self, event_id: &str, guest_id: &str) -> Result<Option<Rsvp>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<RsvpWithPlusOnes>, AppError>;
    async fn list_plus_ones(&self, rsvp_id: &str) -> Result<Vec<RsvpPlusOne>, AppError>;
    async fn update(&self, rsvp: &Rsvp) -> Result<Rsvp, AppError>;
    /// Saves the response and replaces the plus-one list atomically.
    async fn respond(&self, rsvp: &Rsvp, plus_ones: &[RsvpPlusOne]) -> Result<RsvpWithPlusOnes, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_template(&self, template: &NotificationTemplate) -> Result<NotificationTemplate, AppError>;
    async fn get_template(&self, id: &str) -> Result<Option<NotificationTemplate>, AppError>;
    async fn find_template_by_name(&self, name: &str) -> Result<Option<NotificationTemplate>, AppError>;
    async fn list_templates(&self) -> Result<Vec<NotificationTemplate>, AppError>;
    async fn update_template(&self, template: &NotificationTemplate) -> Result<NotificationTemplate, AppError>;
    async fn delete_template(&self, id: &str) -> Result<(), AppError>;

    /// Inserts the notification together with its recipient snapshot.
    async fn create(&self, notification: &Notification, recipients: &[NotificationRecipient]) -> Result<Notification, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>, AppError>;
    async fn list(&self, event_id: Option<&str>) -> Result<Vec<Notification>, AppError>;
    async fn schedule(&self, id: &str, at: DateTime<Utc>) -> Result<Notification, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    /// Moves due `scheduled` notifications to `sending` and returns them.
    async fn claim_due(&self, now: DateTime<Utc>, limit: i32) -> Result<Vec<Notification>, AppError>;
    async fn finish(&self, id: &str, status: NotificationStatus, sent_at: Option<DateTime<Utc>>) -> Result<(), AppError>;
    /// Puts notifications and recipients left in `sending` by a stopped process back in the queue.
    /// Returns how many notifications were requeued.
    async fn requeue_interrupted(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    async fn list_recipients(&self, notification_id: &str) -> Result<Vec<NotificationRecipient>, AppError>;
    async fn find_recipient(&self, notification_id: &str, id: &str) -> Result<Option<NotificationRecipient>, AppError>;
    async fn update_recipient(&self, recipient: &NotificationRecipient) -> Result<NotificationRecipient, AppError>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, log: &AuditLog) -> Result<(), AppError>;
    async fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditLog>, AppError>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn event_stats(&self, event_id: &str) -> Result<EventStats, AppError>;
    /// `created_by = None` aggregates over every event.
    async fn dashboard_stats(&self, scope: EventScope<'_>, now: DateTime<Utc>) -> Result<DashboardStats, AppError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Setting>, AppError>;
    async fn get(&self, key: &str) -> Result<Option<Setting>, AppError>;
    async fn upsert(&self, key: &str, value: &Value, updated_by: Option<&str>) -> Result<Setting, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, attachment_name: Option<&str>, attachment_data: Option<&[u8]>) -> Result<(), AppError>;
}
