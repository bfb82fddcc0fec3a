use crate::domain::models::{
    user::User, class::ClassSession, booking::{Reservation, CancelOutcome},
    membership::{MembershipPlan, MembershipGrant}, payment::Payment, trainer::Trainer,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn create(&self, class: &ClassSession) -> Result<ClassSession, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ClassSession>, AppError>;
    async fn list(&self) -> Result<Vec<ClassSession>, AppError>;
}

#[async_trait]
pub trait TrainerRepository: Send + Sync {
    async fn create(&self, trainer: &Trainer) -> Result<Trainer, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Trainer>, AppError>;
    async fn list(&self) -> Result<Vec<Trainer>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Admission as one unit of work: class exists, seat free, membership
    /// covers `today`, no live booking for the pair, then insert. Any failed
    /// check rolls the whole transaction back.
    async fn reserve(&self, reservation: &Reservation, today: NaiveDate) -> Result<Reservation, AppError>;
    /// booked -> cancelled for the owner; cancelling twice is not an error.
    async fn cancel(&self, reservation_id: &str, user_id: &str, at: DateTime<Utc>) -> Result<CancelOutcome, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, AppError>;
    async fn list_by_class(&self, class_id: &str) -> Result<Vec<Reservation>, AppError>;
    async fn list_all(&self, status: Option<&str>) -> Result<Vec<Reservation>, AppError>;
    async fn count_booked(&self, class_id: &str) -> Result<i64, AppError>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn create_plan(&self, plan: &MembershipPlan) -> Result<MembershipPlan, AppError>;
    async fn find_plan(&self, id: &str) -> Result<Option<MembershipPlan>, AppError>;
    async fn list_plans(&self) -> Result<Vec<MembershipPlan>, AppError>;
    /// Inserts the payment and the grant in one transaction.
    async fn record_purchase(&self, payment: &Payment, grant: &MembershipGrant) -> Result<(), AppError>;
    async fn has_active_membership(&self, user_id: &str, day: NaiveDate) -> Result<bool, AppError>;
    async fn find_current_grant(&self, user_id: &str, day: NaiveDate) -> Result<Option<MembershipGrant>, AppError>;
    async fn list_grants(&self, user_id: &str) -> Result<Vec<MembershipGrant>, AppError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, AppError>;
    async fn list_by_user(&self, user_id: &str, status: Option<&str>) -> Result<Vec<Payment>, AppError>;
    async fn list_all(&self, status: Option<&str>) -> Result<Vec<Payment>, AppError>;
}

/// Outbound delivery channel. Retry policy belongs to the dispatcher, not
/// to implementations of this trait.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}

/// TTL-bounded key/value store holding serialized values. Never
/// authoritative: every entry may be dropped at any time.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
    async fn delete(&self, key: &str);
    async fn delete_by_prefix(&self, prefix: &str) -> usize;
    async fn purge_expired(&self) -> usize;
    async fn len(&self) -> usize;
}
