use crate::domain::models::{
    booking::{CancelOutcome, Reservation},
    session::Session,
    user::User,
};
use crate::domain::services::notification_dispatcher::DispatcherStats;
use crate::infra::cache::data_cache::CacheStats;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

impl LoginResponse {
    pub fn new(session: Session, user: &User) -> Self {
        Self {
            token: session.id,
            expires_at: session.expires_at,
            user: user.into(),
        }
    }
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub reservation: Reservation,
    pub already_cancelled: bool,
}

impl From<CancelOutcome> for CancelResponse {
    fn from(outcome: CancelOutcome) -> Self {
        let already_cancelled = matches!(outcome, CancelOutcome::AlreadyCancelled(_));
        Self { reservation: outcome.into_reservation(), already_cancelled }
    }
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    pub notifications: DispatcherStats,
}
