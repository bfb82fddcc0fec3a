use crate::domain::ports::CacheStore;
use crate::metrics;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::warn;

pub mod keys {
    pub const CLASSES_ALL: &str = "classes:all";
    pub const TRAINERS_ALL: &str = "trainers:all";
    pub const MEMBERSHIPS_ALL: &str = "memberships:all";

    pub fn class(id: &str) -> String { format!("class:{}", id) }
    pub fn class_bookings(id: &str) -> String { format!("class_bookings:{}", id) }
    pub fn trainer(id: &str) -> String { format!("trainer:{}", id) }
    pub fn membership(id: &str) -> String { format!("membership:{}", id) }
    pub fn user(id: &str) -> String { format!("user:{}", id) }
    pub fn user_membership(user_id: &str) -> String { format!("user_membership:{}", user_id) }
    pub fn user_bookings(user_id: &str) -> String { format!("user_bookings:{}", user_id) }
    pub fn user_payments(user_id: &str) -> String { format!("user_payments:{}", user_id) }
    pub fn session(session_id: &str) -> String { format!("session:{}", session_id) }
    pub fn user_session(user_id: &str) -> String { format!("user_session:{}", user_id) }
}

pub mod ttl {
    use std::time::Duration;

    const MINUTE: u64 = 60;

    pub const CLASSES_LIST: Duration = Duration::from_secs(5 * MINUTE);
    pub const CLASS: Duration = Duration::from_secs(10 * MINUTE);
    pub const TRAINERS_LIST: Duration = Duration::from_secs(10 * MINUTE);
    pub const TRAINER: Duration = Duration::from_secs(30 * MINUTE);
    pub const PLANS_LIST: Duration = Duration::from_secs(30 * MINUTE);
    pub const PLAN: Duration = Duration::from_secs(60 * MINUTE);
    pub const USER: Duration = Duration::from_secs(15 * MINUTE);
    pub const USER_MEMBERSHIP: Duration = Duration::from_secs(5 * MINUTE);
    pub const BOOKINGS: Duration = Duration::from_secs(2 * MINUTE);
    pub const PAYMENTS: Duration = Duration::from_secs(2 * MINUTE);
    pub const SESSION: Duration = Duration::from_secs(24 * 60 * MINUTE);
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
    pub entries: usize,
}

/// Typed JSON view over a [`CacheStore`], counting hits and misses.
///
/// A value that fails to decode is treated as a miss and evicted.
pub struct DataCache {
    store: Arc<dyn CacheStore>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DataCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store, hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let decoded = match self.store.get(key).await {
            Some(raw) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = %key, "Dropping undecodable cache entry: {}", e);
                    self.store.delete(key).await;
                    None
                }
            },
            None => None,
        };

        let hit = decoded.is_some();
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        metrics::record_cache(hit);
        decoded
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => self.store.set(key, raw, ttl).await,
            Err(e) => warn!(key = %key, "Skipping cache write, value not serializable: {}", e),
        }
    }

    pub async fn invalidate(&self, keys: &[String]) {
        for key in keys {
            self.store.delete(key).await;
        }
    }

    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.store.delete_by_prefix(prefix).await
    }

    pub async fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_ratio: if total == 0 { 0.0 } else { hits as f64 / total as f64 },
            entries: self.store.len().await,
        }
    }
}
