//! Prometheus counters for admission, purchases, notification delivery and
//! the cache layer.
//!
//! Recording goes through the `metrics` facade, so it is a no-op until
//! [`install_recorder`] has run. Tests never install one.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

pub const RESERVATIONS_TOTAL: &str = "gym_reservations_total";
pub const PURCHASES_TOTAL: &str = "gym_purchases_total";
pub const NOTIFICATIONS_TOTAL: &str = "gym_notifications_total";
pub const CACHE_REQUESTS_TOTAL: &str = "gym_cache_requests_total";
pub const RATE_LIMITED_TOTAL: &str = "gym_rate_limited_requests_total";

/// Installs the global Prometheus recorder. Returns `None` when another
/// recorder already owns the process.
pub fn install_recorder() -> Option<PrometheusHandle> {
    describe_metrics();
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("Prometheus recorder installed, scrape /metrics");
            Some(handle)
        }
        Err(e) => {
            warn!("Metrics recorder not installed: {}", e);
            None
        }
    }
}

fn describe_metrics() {
    describe_counter!(RESERVATIONS_TOTAL, "Reservation attempts by outcome (admitted or rejection reason)");
    describe_counter!(PURCHASES_TOTAL, "Membership purchases by outcome");
    describe_counter!(NOTIFICATIONS_TOTAL, "Notification jobs by delivery outcome");
    describe_counter!(CACHE_REQUESTS_TOTAL, "Cache lookups by result (hit or miss)");
    describe_counter!(RATE_LIMITED_TOTAL, "Requests rejected by the global rate limiter");
}

pub fn record_reservation(outcome: &'static str) {
    counter!(RESERVATIONS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_purchase(outcome: &'static str) {
    counter!(PURCHASES_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_notifications(outcome: &'static str, count: u64) {
    counter!(NOTIFICATIONS_TOTAL, "outcome" => outcome).increment(count);
}

pub fn record_rate_limited() {
    counter!(RATE_LIMITED_TOTAL).increment(1);
}

pub fn record_cache(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!(CACHE_REQUESTS_TOTAL, "result" => result).increment(1);
}
