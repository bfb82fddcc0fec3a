use crate::domain::models::{
    booking::{reservation_status, Reservation},
    class::{ClassSession, NewClassParams},
    membership::{MembershipGrant, MembershipPlan},
    payment::{payment_status, Payment},
    trainer::Trainer,
    user::User,
};
use crate::domain::ports::{
    BookingRepository, ClassRepository, MembershipRepository, PaymentRepository, TrainerRepository, UserRepository,
};
use crate::error::AppError;
use crate::infra::cache::data_cache::{keys, ttl, DataCache};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Key families a cache flush may never touch: dropping them logs users out.
const SESSION_KEY_PREFIXES: [&str; 2] = ["session:", "user_session:"];

/// Read-through access to everything the booking and purchase paths do not
/// mutate in a transaction, plus the admin inserts that feed it.
pub struct CatalogService {
    classes: Arc<dyn ClassRepository>,
    trainers: Arc<dyn TrainerRepository>,
    bookings: Arc<dyn BookingRepository>,
    memberships: Arc<dyn MembershipRepository>,
    payments: Arc<dyn PaymentRepository>,
    users: Arc<dyn UserRepository>,
    cache: Arc<DataCache>,
}

impl CatalogService {
    pub fn new(
        classes: Arc<dyn ClassRepository>,
        trainers: Arc<dyn TrainerRepository>,
        bookings: Arc<dyn BookingRepository>,
        memberships: Arc<dyn MembershipRepository>,
        payments: Arc<dyn PaymentRepository>,
        users: Arc<dyn UserRepository>,
        cache: Arc<DataCache>,
    ) -> Self {
        Self { classes, trainers, bookings, memberships, payments, users, cache }
    }

    async fn read_through<T, F>(&self, key: &str, ttl: Duration, load: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T, AppError>>,
    {
        if let Some(hit) = self.cache.get::<T>(key).await {
            return Ok(hit);
        }
        let value = load.await?;
        self.cache.set(key, &value, ttl).await;
        Ok(value)
    }

    pub async fn list_classes(&self) -> Result<Vec<ClassSession>, AppError> {
        self.read_through(keys::CLASSES_ALL, ttl::CLASSES_LIST, self.classes.list()).await
    }

    pub async fn get_class(&self, id: &str) -> Result<ClassSession, AppError> {
        self.read_through(&keys::class(id), ttl::CLASS, async {
            self.classes.find_by_id(id).await?.ok_or_else(|| AppError::ClassNotFound(id.to_string()))
        }).await
    }

    pub async fn class_bookings(&self, class_id: &str) -> Result<Vec<Reservation>, AppError> {
        self.get_class(class_id).await?;
        self.read_through(&keys::class_bookings(class_id), ttl::BOOKINGS, self.bookings.list_by_class(class_id)).await
    }

    pub async fn user_bookings(&self, user_id: &str) -> Result<Vec<Reservation>, AppError> {
        self.read_through(&keys::user_bookings(user_id), ttl::BOOKINGS, self.bookings.list_by_user(user_id)).await
    }

    pub async fn list_trainers(&self) -> Result<Vec<Trainer>, AppError> {
        self.read_through(keys::TRAINERS_ALL, ttl::TRAINERS_LIST, self.trainers.list()).await
    }

    pub async fn get_trainer(&self, id: &str) -> Result<Trainer, AppError> {
        self.read_through(&keys::trainer(id), ttl::TRAINER, async {
            self.trainers.find_by_id(id).await?.ok_or_else(|| AppError::NotFound(format!("Trainer {}", id)))
        }).await
    }

    pub async fn list_plans(&self) -> Result<Vec<MembershipPlan>, AppError> {
        self.read_through(keys::MEMBERSHIPS_ALL, ttl::PLANS_LIST, self.memberships.list_plans()).await
    }

    pub async fn get_plan(&self, id: &str) -> Result<MembershipPlan, AppError> {
        self.read_through(&keys::membership(id), ttl::PLAN, async {
            self.memberships.find_plan(id).await?.ok_or_else(|| AppError::PlanNotFound(id.to_string()))
        }).await
    }

    /// The grant covering today, if any. "No membership" is cached too.
    pub async fn current_membership(&self, user_id: &str) -> Result<Option<MembershipGrant>, AppError> {
        let today = Utc::now().date_naive();
        self.read_through(&keys::user_membership(user_id), ttl::USER_MEMBERSHIP, self.memberships.find_current_grant(user_id, today)).await
    }

    /// Only the unfiltered list is cached.
    pub async fn user_payments(&self, user_id: &str, status: Option<&str>) -> Result<Vec<Payment>, AppError> {
        match status {
            Some(status) => self.payments.list_by_user(user_id, Some(payment_status(status)?)).await,
            None => self.read_through(&keys::user_payments(user_id), ttl::PAYMENTS, self.payments.list_by_user(user_id, None)).await,
        }
    }

    pub async fn find_payment(&self, id: &str) -> Result<Payment, AppError> {
        self.payments.find_by_id(id).await?.ok_or_else(|| AppError::NotFound(format!("Payment {}", id)))
    }

    // Admin listings read the store directly.
    pub async fn all_payments(&self, status: Option<&str>) -> Result<Vec<Payment>, AppError> {
        let status = status.map(payment_status).transpose()?;
        self.payments.list_all(status).await
    }

    pub async fn all_bookings(&self, status: Option<&str>) -> Result<Vec<Reservation>, AppError> {
        let status = status.map(reservation_status).transpose()?;
        self.bookings.list_all(status).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, AppError> {
        self.read_through(&keys::user(id), ttl::USER, async {
            self.users.find_by_id(id).await?.ok_or_else(|| AppError::NotFound(format!("User {}", id)))
        }).await
    }

    pub async fn create_class(&self, params: NewClassParams) -> Result<ClassSession, AppError> {
        if params.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".into()));
        }
        if params.duration_min <= 0 {
            return Err(AppError::Validation("Duration must be positive".into()));
        }
        if params.capacity < 0 {
            return Err(AppError::Validation("Capacity cannot be negative".into()));
        }
        if let Some(trainer_id) = &params.trainer_id {
            self.get_trainer(trainer_id).await?;
        }

        let created = self.classes.create(&ClassSession::new(params)).await?;
        self.cache.invalidate(&[keys::CLASSES_ALL.to_string()]).await;
        info!(class_id = %created.id, capacity = created.capacity, "Class created");
        Ok(created)
    }

    pub async fn create_plan(&self, name: String, duration_days: i32, price_cents: i64) -> Result<MembershipPlan, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Plan name is required".into()));
        }
        if duration_days <= 0 {
            return Err(AppError::Validation("Plan duration must be positive".into()));
        }
        if price_cents < 0 {
            return Err(AppError::Validation("Price cannot be negative".into()));
        }

        let created = self.memberships.create_plan(&MembershipPlan::new(name, duration_days, price_cents)).await?;
        self.cache.invalidate(&[keys::MEMBERSHIPS_ALL.to_string()]).await;
        info!(plan_id = %created.id, "Membership plan created");
        Ok(created)
    }

    pub async fn create_trainer(&self, name: String, bio: Option<String>) -> Result<Trainer, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Trainer name is required".into()));
        }

        let created = self.trainers.create(&Trainer::new(name.trim().to_string(), bio)).await?;
        self.cache.invalidate(&[keys::TRAINERS_ALL.to_string()]).await;
        info!(trainer_id = %created.id, "Trainer created");
        Ok(created)
    }

    /// Drops every cached entry whose key starts with `prefix`. Session keys
    /// are out of reach.
    pub async fn flush_cache(&self, prefix: &str) -> Result<usize, AppError> {
        if prefix.is_empty() {
            return Err(AppError::Validation("Cache prefix is required".into()));
        }
        if SESSION_KEY_PREFIXES.iter().any(|p| p.starts_with(prefix) || prefix.starts_with(p)) {
            return Err(AppError::Validation("Session entries cannot be flushed".into()));
        }
        let removed = self.cache.invalidate_prefix(prefix).await;
        info!(prefix = %prefix, removed = removed, "Cache entries flushed");
        Ok(removed)
    }
}
