use std::sync::Arc;
use crate::domain::ports::{
    AuditRepository, AuthRepository, EmailService, EventGuestRepository, EventRepository, GroupRepository,
    GuestRepository, NotificationRepository, ReportRepository, RoleRepository, RsvpRepository,
    SettingsRepository, UserRepository, VenueRepository,
};
use crate::domain::services::{
    audit_service::AuditService, auth_service::AuthService, notification_service::NotificationService,
};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub role_repo: Arc<dyn RoleRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub venue_repo: Arc<dyn VenueRepository>,
    pub guest_repo: Arc<dyn GuestRepository>,
    pub event_guest_repo: Arc<dyn EventGuestRepository>,
    pub group_repo: Arc<dyn GroupRepository>,
    pub rsvp_repo: Arc<dyn RsvpRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub audit_repo: Arc<dyn AuditRepository>,
    pub report_repo: Arc<dyn ReportRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub auth_service: Arc<AuthService>,
    pub audit_service: Arc<AuditService>,
    pub notification_service: Arc<NotificationService>,
    pub email_service: Arc<dyn EmailService>,
}
