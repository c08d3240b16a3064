use std::env;
use std::fmt;

const DEV_JWT_SECRET: &str = "rsvp-development-secret-change-me";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Test,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match env::var("APP_ENV").unwrap_or_default().to_lowercase().as_str() {
            "production" | "prod" => AppEnv::Production,
            "test" => AppEnv::Test,
            _ => AppEnv::Development,
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppEnv::Development => "development",
            AppEnv::Test => "test",
            AppEnv::Production => "production",
        };
        f.write_str(name)
    }
}

/// Console output style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" | "plain" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl LogRotation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "hourly" => Some(LogRotation::Hourly),
            "daily" => Some(LogRotation::Daily),
            "never" => Some(LogRotation::Never),
            _ => None,
        }
    }
}

/// Logging is configured before anything else, so it is read separately from [`Config`].
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub console_format: LogFormat,
    /// `None` disables the JSON file sink.
    pub file_dir: Option<String>,
    pub file_rotation: LogRotation,
    pub file_filter: String,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let app_env = AppEnv::from_env();
        Self::from_lookup(app_env, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(app_env: AppEnv, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_format = match app_env {
            AppEnv::Production => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let file_dir = match lookup("LOG_DIR") {
            Some(dir) if dir.trim().is_empty() || dir.eq_ignore_ascii_case("off") => None,
            Some(dir) => Some(dir),
            None if app_env == AppEnv::Test => None,
            None => Some("./logs".to_string()),
        };

        Self {
            console_format: lookup("LOG_FORMAT").as_deref().and_then(LogFormat::parse).unwrap_or(default_format),
            file_dir,
            file_rotation: lookup("LOG_ROTATION").as_deref().and_then(LogRotation::parse).unwrap_or(LogRotation::Daily),
            file_filter: lookup("LOG_FILE_FILTER").unwrap_or_else(|| "info,rsvp_backend=debug".to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub database_path: String,
    pub port: u16,
    pub jwt_secret: String,
    pub auth_issuer: String,
    pub frontend_url: String,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub allow_registration: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Self {
        let app_env = AppEnv::from_env();

        let database_path = match app_env {
            AppEnv::Development => env::var("DEV_DATABASE_PATH").unwrap_or_else(|_| "data/development.sqlite".to_string()),
            AppEnv::Test => env::var("TEST_DATABASE_PATH").unwrap_or_else(|_| "data/test.sqlite".to_string()),
            AppEnv::Production => env::var("DATABASE_PATH").unwrap_or_else(|_| "data/production.sqlite".to_string()),
        };

        let jwt_secret = match app_env {
            AppEnv::Production => env::var("JWT_SECRET").expect("JWT_SECRET must be set in production"),
            _ => env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),
        };

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_USERNAME"),
            env::var("BOOTSTRAP_ADMIN_EMAIL"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(email), Ok(password)) => Some(BootstrapAdmin {
                username,
                email: email.trim().to_lowercase(),
                password,
            }),
            _ => None,
        };

        Self {
            app_env,
            database_path,
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_secret,
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "rsvp-backend".to_string()),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_default(),
            allow_registration: env::var("ALLOW_REGISTRATION").map(|v| v == "true" || v == "1").unwrap_or(false),
            bootstrap_admin,
        }
    }

    /// sqlx connection string for the environment's database file.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.database_path)
    }

    pub fn rsvp_link(&self, token: &str) -> String {
        format!("{}/rsvp/{}", self.frontend_url.trim_end_matches('/'), token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url.trim_end_matches('/'), token)
    }
}
