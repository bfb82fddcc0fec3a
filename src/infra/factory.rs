use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{
    BookingRepository, ClassRepository, EmailService, MembershipRepository, PaymentRepository, TrainerRepository,
    UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService, catalog::CatalogService, membership_ledger::MembershipLedger,
    notification_dispatcher::{DispatcherSettings, NotificationDispatcher},
    notification_templates::NotificationTemplates,
    reservation_engine::{ReservationEngine, ReservationSettings},
    session_store::SessionStore,
};
use crate::error::AppError;
use crate::infra::cache::{data_cache::DataCache, memory::InMemoryCache};
use crate::infra::email::{http_email_service::HttpEmailService, log_email_service::LogEmailService};
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_class_repo::PostgresClassRepo,
    postgres_membership_repo::PostgresMembershipRepo, postgres_payment_repo::PostgresPaymentRepo,
    postgres_trainer_repo::PostgresTrainerRepo, postgres_user_repo::PostgresUserRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_class_repo::SqliteClassRepo,
    sqlite_membership_repo::SqliteMembershipRepo, sqlite_payment_repo::SqlitePaymentRepo,
    sqlite_trainer_repo::SqliteTrainerRepo, sqlite_user_repo::SqliteUserRepo,
};
use crate::state::AppState;

/// Store adapters for one backend.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub classes: Arc<dyn ClassRepository>,
    pub trainers: Arc<dyn TrainerRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub payments: Arc<dyn PaymentRepository>,
}

impl Repositories {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            users: Arc::new(SqliteUserRepo::new(pool.clone())),
            classes: Arc::new(SqliteClassRepo::new(pool.clone())),
            trainers: Arc::new(SqliteTrainerRepo::new(pool.clone())),
            bookings: Arc::new(SqliteBookingRepo::new(pool.clone())),
            memberships: Arc::new(SqliteMembershipRepo::new(pool.clone())),
            payments: Arc::new(SqlitePaymentRepo::new(pool)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepo::new(pool.clone())),
            classes: Arc::new(PostgresClassRepo::new(pool.clone())),
            trainers: Arc::new(PostgresTrainerRepo::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepo::new(pool.clone())),
            memberships: Arc::new(PostgresMembershipRepo::new(pool.clone())),
            payments: Arc::new(PostgresPaymentRepo::new(pool)),
        }
    }
}

pub async fn bootstrap_state(config: &Config, metrics_handle: Option<PrometheusHandle>) -> Result<AppState, AppError> {
    let repos = connect(config).await?;
    let email_service = email_service(config)?;
    let state = assemble_state(config, repos, email_service, metrics_handle)?;

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        state.auth_service.ensure_admin(email, password).await?;
    }
    Ok(state)
}

pub async fn connect(config: &Config) -> Result<Repositories, AppError> {
    let database_url = &config.database_url;

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let opts: PgConnectOptions = database_url.parse().map_err(AppError::Database)?;
        let opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .map_err(AppError::Database)?;

        run_postgres_migrations(&pool).await?;
        Ok(Repositories::postgres(pool))
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .map_err(AppError::Database)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(AppError::Database)?;

        run_sqlite_migrations(&pool).await?;
        Ok(Repositories::sqlite(pool))
    }
}

pub fn email_service(config: &Config) -> Result<Arc<dyn EmailService>, AppError> {
    match &config.mail_service_url {
        Some(url) => {
            info!("Notifications will be sent through {}", url);
            Ok(Arc::new(HttpEmailService::new(url.clone(), config.mail_service_token.clone())?))
        }
        None => {
            info!("MAIL_SERVICE_URL not set, notifications will be logged only");
            Ok(Arc::new(LogEmailService))
        }
    }
}

/// Wires services over the given adapters. Spawns the notification worker,
/// so it must run inside a tokio runtime.
pub fn assemble_state(
    config: &Config,
    repos: Repositories,
    email_service: Arc<dyn EmailService>,
    metrics_handle: Option<PrometheusHandle>,
) -> Result<AppState, AppError> {
    let cache = Arc::new(DataCache::new(Arc::new(InMemoryCache::new())));
    let sessions = Arc::new(SessionStore::new(cache.clone(), config.session_ttl));
    let templates = Arc::new(NotificationTemplates::new()?);
    let dispatcher = Arc::new(NotificationDispatcher::start(email_service, DispatcherSettings::from_config(config)));

    let reservations = Arc::new(ReservationEngine::new(
        repos.bookings.clone(),
        repos.classes.clone(),
        repos.users.clone(),
        cache.clone(),
        dispatcher.clone(),
        templates.clone(),
        ReservationSettings::from_config(config),
    ));
    let catalog = Arc::new(CatalogService::new(
        repos.classes.clone(),
        repos.trainers.clone(),
        repos.bookings.clone(),
        repos.memberships.clone(),
        repos.payments.clone(),
        repos.users.clone(),
        cache.clone(),
    ));
    let ledger = Arc::new(MembershipLedger::new(
        repos.memberships.clone(),
        repos.users.clone(),
        catalog.clone(),
        cache.clone(),
        dispatcher.clone(),
        templates,
        config,
    ));
    let auth_service = Arc::new(AuthService::new(repos.users.clone(), sessions.clone()));

    Ok(AppState {
        config: config.clone(),
        user_repo: repos.users,
        class_repo: repos.classes,
        trainer_repo: repos.trainers,
        booking_repo: repos.bookings,
        membership_repo: repos.memberships,
        payment_repo: repos.payments,
        cache,
        sessions,
        dispatcher,
        reservations,
        ledger,
        catalog,
        auth_service,
        metrics_handle,
        rate_limiter: rate_limiter(config),
    })
}

fn rate_limiter(config: &Config) -> Option<Arc<DefaultDirectRateLimiter>> {
    let per_second = NonZeroU32::new(config.rate_limit_per_second)?;
    let burst = NonZeroU32::new(config.rate_limit_burst).unwrap_or(per_second);
    info!(per_second = per_second.get(), burst = burst.get(), "Request rate limiter enabled");
    Some(Arc::new(RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst))))
}

async fn run_postgres_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Postgres migrations failed: {}", e)))
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("SQLite migrations failed: {}", e)))
}
