#![allow(dead_code)]

use rsvp_backend::{
    api::router::create_router,
    config::{AppEnv, Config},
    domain::models::{role::RoleName, user::User},
    domain::ports::EmailService,
    domain::services::password,
    error::AppError,
    infra::factory::{build_state, connect_sqlite, run_sqlite_migrations, seed_default_templates},
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

#[derive(Clone, Debug)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: Option<String>,
    pub attachment: Option<Vec<u8>>,
}

/// Records every message instead of delivering it. Addresses listed in `reject` fail.
#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentMail>>,
    pub reject: Mutex<Vec<String>>,
}

impl MockEmailService {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        attachment_name: Option<&str>,
        attachment_data: Option<&[u8]>,
    ) -> Result<(), AppError> {
        if self.reject.lock().unwrap().iter().any(|r| r == recipient) {
            return Err(AppError::InternalWithMsg(format!("mailbox {} unavailable", recipient)));
        }
        self.sent.lock().unwrap().push(SentMail {
            to: recipient.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
            attachment_name: attachment_name.map(str::to_string),
            attachment: attachment_data.map(<[u8]>::to_vec),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_path: PathBuf,
    pub state: Arc<AppState>,
    pub mail: Arc<MockEmailService>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let db_path = std::env::temp_dir().join(format!("rsvp_test_{}.db", Uuid::new_v4()));

        let mut config = Config {
            app_env: AppEnv::Test,
            database_path: db_path.to_string_lossy().to_string(),
            port: 0,
            jwt_secret: "test-secret".to_string(),
            auth_issuer: "test-issuer".to_string(),
            frontend_url: "http://frontend.test".to_string(),
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: String::new(),
            allow_registration: false,
            bootstrap_admin: None,
        };
        customize(&mut config);

        let pool = connect_sqlite(&config.database_url())
            .await
            .expect("Failed to connect to test db");
        run_sqlite_migrations(&pool).await;

        let mail = Arc::new(MockEmailService::default());
        let state = Arc::new(build_state(pool.clone(), config, mail.clone()));
        seed_default_templates(&state).await.expect("Failed to seed templates");

        let router = create_router(state.clone());

        Self { router, pool, db_path, state, mail }
    }

    /// Creates an active user with the given roles directly in the database. Returns the user id.
    pub async fn create_user(&self, username: &str, roles: &[RoleName]) -> String {
        let hash = password::hash_password(TEST_PASSWORD).unwrap();
        let user = User::new(username.to_string(), format!("{}@example.com", username), hash);
        let user = self.state.user_repo.create(&user).await.unwrap();
        self.state.role_repo.set_user_roles(&user.id, roles).await.unwrap();
        user.id
    }

    pub async fn login_body(&self, login: &str, password: &str) -> (StatusCode, Value) {
        self.request(Method::POST, "/api/auth/login", None, Some(json!({ "login": login, "password": password }))).await
    }

    pub async fn login(&self, login: &str) -> String {
        let (status, body) = self.login_body(login, TEST_PASSWORD).await;
        if status != StatusCode::OK {
            panic!("Login failed in test helper: status {} body {}", status, body);
        }
        body["access_token"].as_str().expect("No access_token in body").to_string()
    }

    /// New user with `roles`, logged in. Returns the bearer token.
    pub async fn token_for(&self, username: &str, roles: &[RoleName]) -> String {
        self.create_user(username, roles).await;
        self.login(username).await
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Creates a draft event ten days ahead and returns its id.
    pub async fn create_event(&self, token: &str, extra: Value) -> String {
        let start = Utc::now() + Duration::days(10);
        let mut payload = json!({
            "name": "Garden Party",
            "event_type": "birthday",
            "start_date": start.to_rfc3339(),
            "end_date": (start + Duration::hours(5)).to_rfc3339(),
            "timezone": "Europe/Berlin",
        });
        if let (Some(base), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        let (status, body) = self.post("/api/events", token, payload).await;
        assert_eq!(status, StatusCode::CREATED, "create event failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_guest(&self, token: &str, first: &str, last: &str, email: Option<&str>) -> String {
        let (status, body) = self.post("/api/guests", token, json!({
            "first_name": first,
            "last_name": last,
            "email": email,
        })).await;
        assert_eq!(status, StatusCode::CREATED, "create guest failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn invite(&self, token: &str, event_id: &str, guest_id: &str) {
        let (status, body) = self.post(
            &format!("/api/events/{}/guests", event_id),
            token,
            json!({ "guest_id": guest_id }),
        ).await;
        assert_eq!(status, StatusCode::CREATED, "invite failed: {}", body);
    }

    pub async fn rsvp_token(&self, event_id: &str, guest_id: &str) -> String {
        self.state.rsvp_repo.find_by_event_guest(event_id, guest_id).await.unwrap()
            .expect("RSVP missing")
            .token
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let path = self.db_path.to_string_lossy().to_string();
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path, suffix));
        }
    }
}
