pub mod sqlite_audit_repo;
pub mod sqlite_auth_repo;
pub mod sqlite_event_guest_repo;
pub mod sqlite_event_repo;
pub mod sqlite_group_repo;
pub mod sqlite_guest_repo;
pub mod sqlite_notification_repo;
pub mod sqlite_report_repo;
pub mod sqlite_role_repo;
pub mod sqlite_rsvp_repo;
pub mod sqlite_settings_repo;
pub mod sqlite_user_repo;
pub mod sqlite_venue_repo;
