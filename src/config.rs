use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// When unset, notifications are only logged.
    pub mail_service_url: Option<String>,
    pub mail_service_token: String,
    pub notification_queue_capacity: usize,
    pub notification_enqueue_timeout: Duration,
    pub notification_max_attempts: u32,
    pub notification_retry_delay: Duration,
    pub notification_shutdown_timeout: Duration,
    pub store_tx_timeout: Duration,
    pub reserve_conflict_retries: u32,
    pub payment_currency: String,
    pub session_ttl: Duration,
    pub cache_janitor_interval: Duration,
    /// Requests admitted per second across the whole API; 0 turns the
    /// limiter off.
    pub rate_limit_per_second: u32,
    pub rate_limit_burst: u32,
    /// Seeded on startup when both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key/value source. Missing, unparsable and
    /// (for timeouts and intervals) zero values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let parse_or = |key: &str, default: u64| -> u64 { parse::<u64>(get(key)).unwrap_or(default) };
        let positive_or = |key: &str, default: u64| -> u64 { parse::<u64>(get(key)).filter(|v| *v > 0).unwrap_or(default) };

        Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite://gym_booking.db".to_string()),
            port: parse(get("PORT")).unwrap_or(3000),
            mail_service_url: get("MAIL_SERVICE_URL"),
            mail_service_token: get("MAIL_SERVICE_TOKEN").unwrap_or_default(),
            notification_queue_capacity: parse::<usize>(get("NOTIFICATION_QUEUE_CAPACITY")).filter(|v| *v > 0).unwrap_or(100),
            notification_enqueue_timeout: Duration::from_millis(parse_or("NOTIFICATION_ENQUEUE_TIMEOUT_MS", 5_000)),
            notification_max_attempts: parse::<u32>(get("NOTIFICATION_MAX_ATTEMPTS")).filter(|v| *v > 0).unwrap_or(3),
            notification_retry_delay: Duration::from_millis(parse_or("NOTIFICATION_RETRY_DELAY_MS", 2_000)),
            notification_shutdown_timeout: Duration::from_millis(positive_or("NOTIFICATION_SHUTDOWN_TIMEOUT_MS", 10_000)),
            store_tx_timeout: Duration::from_millis(positive_or("STORE_TX_TIMEOUT_MS", 5_000)),
            reserve_conflict_retries: parse(get("RESERVE_CONFLICT_RETRIES")).unwrap_or(3),
            payment_currency: get("PAYMENT_CURRENCY").unwrap_or_else(|| "KZT".to_string()),
            session_ttl: Duration::from_secs(3600 * positive_or("SESSION_TTL_HOURS", 24)),
            cache_janitor_interval: Duration::from_secs(positive_or("CACHE_JANITOR_INTERVAL_SECS", 60)),
            rate_limit_per_second: parse(get("RATE_LIMIT_PER_SECOND")).unwrap_or(1),
            rate_limit_burst: parse::<u32>(get("RATE_LIMIT_BURST")).filter(|v| *v > 0).unwrap_or(10),
            admin_email: get("ADMIN_EMAIL"),
            admin_password: get("ADMIN_PASSWORD"),
        }
    }
}

fn parse<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}
