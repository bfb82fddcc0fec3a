use crate::domain::models::session::Session;
use crate::infra::cache::data_cache::{keys, DataCache};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Login sessions kept only in the cache: `session:{sid}` holds the session
/// and `user_session:{uid}` points at the user's most recent one.
pub struct SessionStore {
    cache: Arc<DataCache>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(cache: Arc<DataCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub async fn create_session(&self, user_id: &str, email: &str, is_admin: bool) -> Session {
        let now = Utc::now();
        let session = Session {
            id: hex::encode(rand::random::<[u8; 32]>()),
            user_id: user_id.to_string(),
            user_email: email.to_string(),
            is_admin,
            created_at: now,
            expires_at: now + self.ttl_chrono(),
        };
        self.write(&session).await;
        debug!(user_id = %user_id, "Session created");
        session
    }

    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        let key = keys::session(session_id);
        let session: Session = self.cache.get(&key).await?;
        if session.is_expired_at(Utc::now()) {
            self.cache.invalidate(&[key]).await;
            return None;
        }
        Some(session)
    }

    pub async fn get_user_session(&self, user_id: &str) -> Option<Session> {
        let session: Session = self.cache.get(&keys::user_session(user_id)).await?;
        if session.is_expired_at(Utc::now()) {
            self.cache.invalidate(&[keys::user_session(user_id), keys::session(&session.id)]).await;
            return None;
        }
        Some(session)
    }

    /// Pushes the expiry out by a full TTL from now. `None` if the session is
    /// already gone.
    pub async fn extend_session(&self, session_id: &str) -> Option<Session> {
        let mut session = self.get_session(session_id).await?;
        session.expires_at = Utc::now() + self.ttl_chrono();
        self.write(&session).await;
        Some(session)
    }

    pub async fn delete_session(&self, session_id: &str) {
        let Some(session) = self.cache.get::<Session>(&keys::session(session_id)).await else {
            return;
        };
        let mut stale = vec![keys::session(session_id)];
        if let Some(current) = self.cache.get::<Session>(&keys::user_session(&session.user_id)).await
            && current.id == session_id
        {
            stale.push(keys::user_session(&session.user_id));
        }
        self.cache.invalidate(&stale).await;
    }

    async fn write(&self, session: &Session) {
        self.cache.set(&keys::session(&session.id), session, self.ttl).await;
        self.cache.set(&keys::user_session(&session.user_id), session, self.ttl).await;
    }

    fn ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::hours(24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::cache::memory::InMemoryCache;

    fn store() -> SessionStore {
        let cache = Arc::new(DataCache::new(Arc::new(InMemoryCache::new())));
        SessionStore::new(cache, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_new_login_replaces_user_pointer() {
        let sessions = store();
        let first = sessions.create_session("u1", "a@gym.kz", false).await;
        let second = sessions.create_session("u1", "a@gym.kz", false).await;

        assert_eq!(first.id.len(), 64);
        assert_ne!(first.id, second.id);
        assert_eq!(sessions.get_user_session("u1").await.unwrap().id, second.id);

        sessions.delete_session(&first.id).await;
        assert!(sessions.get_session(&first.id).await.is_none());
        assert_eq!(sessions.get_user_session("u1").await.unwrap().id, second.id);

        sessions.delete_session(&second.id).await;
        assert!(sessions.get_user_session("u1").await.is_none());
    }

    #[tokio::test]
    async fn test_extend_moves_expiry_forward() {
        let sessions = store();
        let created = sessions.create_session("u2", "b@gym.kz", true).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let extended = sessions.extend_session(&created.id).await.unwrap();

        assert!(extended.expires_at > created.expires_at);
        assert!(extended.is_admin);
        assert!(sessions.extend_session("missing").await.is_none());
    }
}
