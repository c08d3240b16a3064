use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::{info, warn};
use log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::error::AppError;
use crate::domain::models::{role::RoleName, user::User};
use crate::domain::ports::EmailService;
use crate::domain::services::{
    audit_service::AuditService, auth_service::AuthService, defaults, notification_service::NotificationService,
    password,
};
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::repositories::{
    sqlite_audit_repo::SqliteAuditRepo, sqlite_auth_repo::SqliteAuthRepo,
    sqlite_event_guest_repo::SqliteEventGuestRepo, sqlite_event_repo::SqliteEventRepo,
    sqlite_group_repo::SqliteGroupRepo, sqlite_guest_repo::SqliteGuestRepo,
    sqlite_notification_repo::SqliteNotificationRepo, sqlite_report_repo::SqliteReportRepo,
    sqlite_role_repo::SqliteRoleRepo, sqlite_rsvp_repo::SqliteRsvpRepo,
    sqlite_settings_repo::SqliteSettingsRepo, sqlite_user_repo::SqliteUserRepo,
    sqlite_venue_repo::SqliteVenueRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    info!("Initializing SQLite connection with WAL Mode ({} environment)...", config.app_env);

    if let Some(parent) = Path::new(&config.database_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).expect("Failed to create database directory");
        }
    }

    let pool = connect_sqlite(&config.database_url())
        .await
        .expect("Failed to connect to SQLite");

    run_sqlite_migrations(&pool).await;

    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));

    let state = build_state(pool, config.clone(), email_service);

    seed_default_templates(&state).await.expect("Failed to seed notification templates");
    bootstrap_admin(&state).await.expect("Failed to create bootstrap admin");

    state
}

pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
}

/// Wires every repository and service around one pool. Tests call this with their own pool and mail stub.
pub fn build_state(pool: SqlitePool, config: Config, email_service: Arc<dyn EmailService>) -> AppState {
    let auth_repo = Arc::new(SqliteAuthRepo::new(pool.clone()));
    let auth_service = Arc::new(AuthService::new(auth_repo.clone(), config.clone()));

    let audit_repo = Arc::new(SqliteAuditRepo::new(pool.clone()));
    let audit_service = Arc::new(AuditService::new(audit_repo.clone()));

    let event_repo = Arc::new(SqliteEventRepo::new(pool.clone()));
    let venue_repo = Arc::new(SqliteVenueRepo::new(pool.clone()));
    let guest_repo = Arc::new(SqliteGuestRepo::new(pool.clone()));
    let event_guest_repo = Arc::new(SqliteEventGuestRepo::new(pool.clone()));
    let rsvp_repo = Arc::new(SqliteRsvpRepo::new(pool.clone()));
    let notification_repo = Arc::new(SqliteNotificationRepo::new(pool.clone()));

    let notification_service = Arc::new(NotificationService::new(
        notification_repo.clone(),
        event_repo.clone(),
        venue_repo.clone(),
        guest_repo.clone(),
        event_guest_repo.clone(),
        rsvp_repo.clone(),
        email_service.clone(),
        config.clone(),
    ));

    AppState {
        config,
        user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
        role_repo: Arc::new(SqliteRoleRepo::new(pool.clone())),
        auth_repo,
        event_repo,
        venue_repo,
        guest_repo,
        event_guest_repo,
        group_repo: Arc::new(SqliteGroupRepo::new(pool.clone())),
        rsvp_repo,
        notification_repo,
        audit_repo,
        report_repo: Arc::new(SqliteReportRepo::new(pool.clone())),
        settings_repo: Arc::new(SqliteSettingsRepo::new(pool)),
        auth_service,
        audit_service,
        notification_service,
        email_service,
    }
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

pub async fn seed_default_templates(state: &AppState) -> Result<(), AppError> {
    for template in defaults::seed_templates() {
        if state.notification_repo.find_template_by_name(&template.name).await?.is_none() {
            info!("Seeding default notification template '{}'", template.name);
            state.notification_repo.create_template(&template).await?;
        }
    }
    Ok(())
}

/// Creates the first admin from BOOTSTRAP_ADMIN_* when the user table is empty.
pub async fn bootstrap_admin(state: &AppState) -> Result<(), AppError> {
    let Some(admin) = &state.config.bootstrap_admin else {
        return Ok(());
    };
    if state.user_repo.count().await? > 0 {
        return Ok(());
    }

    if let Err(e) = password::validate_password(&admin.password) {
        warn!("Bootstrap admin not created: {}", e);
        return Ok(());
    }

    let hash = password::hash_password(&admin.password)?;
    let email = admin.email.trim().to_lowercase();
    let user = state.user_repo.create(&User::new(admin.username.clone(), email, hash)).await?;
    state.role_repo.set_user_roles(&user.id, &[RoleName::Admin]).await?;

    info!("Bootstrap admin '{}' created", user.username);
    Ok(())
}
