use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, info_span, Instrument};
use crate::domain::ports::CacheStore;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Sweeps expired cache entries every `interval` (at least one second) until
/// `stop` flips to true. Reads already ignore expired entries; this only
/// bounds memory.
pub async fn start_cache_janitor(cache: Arc<dyn CacheStore>, interval: Duration, mut stop: watch::Receiver<bool>) {
    let interval = interval.max(MIN_SWEEP_INTERVAL);
    info!(interval_secs = interval.as_secs(), "Starting cache janitor...");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = stop.changed() => break,
            _ = ticker.tick() => {}
        }
        if *stop.borrow() {
            break;
        }

        async {
            let purged = cache.purge_expired().await;
            if purged > 0 {
                let remaining = cache.len().await;
                debug!(purged = purged, remaining = remaining, "Purged expired cache entries");
            }
        }
            .instrument(info_span!("cache_janitor"))
            .await;
    }
    info!("Cache janitor stopped");
}
