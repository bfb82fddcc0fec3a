use gym_booking::{
    api::router::create_router,
    config::Config,
    domain::models::{class::{ClassSession, NewClassParams}, membership::MembershipPlan, user::User},
    domain::ports::EmailService,
    error::AppError,
    infra::factory::{assemble_state, run_sqlite_migrations, Repositories},
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value;
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

/// Delivery channel that records what it was asked to send. The first
/// `failures` sends fail; `delay` is applied to every send.
#[derive(Default)]
pub struct RecordingEmailService {
    pub sent: Mutex<Vec<(String, String)>>,
    pub attempts: AtomicU32,
    failures: AtomicU32,
    delay: Duration,
}

#[allow(dead_code)]
impl RecordingEmailService {
    pub fn failing(failures: u32) -> Self {
        Self { failures: AtomicU32::new(failures), ..Default::default() }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { delay, ..Default::default() }
    }

    pub fn sent_subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, s)| s.clone()).collect()
    }
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send(&self, recipient: &str, subject: &str, _html_body: &str) -> Result<(), AppError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::InternalWithMsg("relay unavailable".into()));
        }
        self.sent.lock().unwrap().push((recipient.to_string(), subject.to_string()));
        Ok(())
    }
}

#[allow(dead_code)]
pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        port: 0,
        mail_service_url: None,
        mail_service_token: String::new(),
        notification_queue_capacity: 100,
        notification_enqueue_timeout: Duration::from_millis(200),
        notification_max_attempts: 3,
        notification_retry_delay: Duration::from_millis(20),
        notification_shutdown_timeout: Duration::from_secs(2),
        store_tx_timeout: Duration::from_secs(10),
        reserve_conflict_retries: 5,
        payment_currency: "KZT".to_string(),
        session_ttl: Duration::from_secs(3600),
        cache_janitor_interval: Duration::from_secs(60),
        rate_limit_per_second: 0,
        rate_limit_burst: 1,
        admin_email: None,
        admin_password: None,
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingEmailService>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_mailer(RecordingEmailService::default()).await
    }

    pub async fn with_mailer(mailer: RecordingEmailService) -> Self {
        Self::build(mailer, |_| {}).await
    }

    /// Default mailer, with `configure` applied to the test config.
    pub async fn with_settings(configure: impl FnOnce(&mut Config)) -> Self {
        Self::build(RecordingEmailService::default(), configure).await
    }

    async fn build(mailer: RecordingEmailService, configure: impl FnOnce(&mut Config)) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        run_sqlite_migrations(&pool).await.expect("Failed to migrate test db");

        let mailer = Arc::new(mailer);
        let mut config = test_config(&db_url);
        configure(&mut config);
        let state = Arc::new(
            assemble_state(&config, Repositories::sqlite(pool.clone()), mailer.clone(), None)
                .expect("Failed to assemble state"),
        );
        let router = create_router(state.clone());

        Self { router, pool, db_filename, state, mailer }
    }

    pub async fn seed_user(&self, name: &str) -> User {
        let email = format!("{}-{}@gym.test", name.to_lowercase(), Uuid::new_v4());
        self.state.user_repo.create(&User::new(name.to_string(), email, "unused".to_string())).await.unwrap()
    }

    pub async fn seed_plan(&self, duration_days: i32, price_cents: i64) -> MembershipPlan {
        self.state.catalog.create_plan(format!("{}-day pass", duration_days), duration_days, price_cents).await.unwrap()
    }

    /// User holding a 30-day membership bought through the ledger.
    pub async fn seed_member(&self, name: &str) -> User {
        let user = self.seed_user(name).await;
        let plan = self.seed_plan(30, 1500).await;
        self.state.ledger.purchase(&user.id, &plan.id, "card").await.unwrap();
        user
    }

    pub async fn seed_class(&self, title: &str, capacity: i32) -> ClassSession {
        self.state.catalog.create_class(NewClassParams {
            title: title.to_string(),
            description: None,
            trainer_id: None,
            start_time: Utc::now() + ChronoDuration::days(1),
            duration_min: 60,
            capacity,
        }).await.unwrap()
    }

    pub async fn booked_count(&self, class_id: &str) -> i64 {
        sqlx::query_scalar("SELECT booked_count FROM classes WHERE id = ?")
            .bind(class_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (u16, Value) {
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
        let status = response.status().as_u16();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    /// Registers through the API and returns the bearer token.
    pub async fn register_and_login(&self, name: &str, email: &str, password: &str) -> String {
        let (status, _) = self.request("POST", "/api/v1/auth/register", None, Some(serde_json::json!({
            "name": name, "email": email, "password": password
        }))).await;
        assert_eq!(status, 201, "register failed");
        self.login(email, password).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self.request("POST", "/api/v1/auth/login", None, Some(serde_json::json!({
            "email": email, "password": password
        }))).await;
        if status != 200 {
            panic!("Login failed in test helper: status {}", status);
        }
        body["token"].as_str().expect("No token in body").to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.state.auth_service.ensure_admin("admin@gym.test", "admin-password").await.unwrap();
        self.login("admin@gym.test", "admin-password").await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

/// Polls `check` for up to two seconds.
#[allow(dead_code)]
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
