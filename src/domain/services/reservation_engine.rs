use crate::config::Config;
use crate::domain::models::{
    booking::{CancelOutcome, Reservation}, class::ClassSession, notification::NotificationJob, user::User,
};
use crate::domain::ports::{BookingRepository, ClassRepository, UserRepository};
use crate::domain::services::keyed_locks::KeyedLocks;
use crate::domain::services::notification_dispatcher::NotificationDispatcher;
use crate::domain::services::notification_templates::NotificationTemplates;
use crate::error::AppError;
use crate::infra::cache::data_cache::{keys, DataCache};
use crate::metrics;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const CONFLICT_BACKOFF_STEP: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
pub struct ReservationSettings {
    pub tx_timeout: Duration,
    pub conflict_retries: u32,
}

impl ReservationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tx_timeout: config.store_tx_timeout,
            conflict_retries: config.reserve_conflict_retries,
        }
    }
}

/// Admission control for class seats.
///
/// Requests for the same class are serialized in-process, and the store
/// re-checks every precondition inside one transaction, so several engines
/// sharing a database still never over-book.
pub struct ReservationEngine {
    bookings: Arc<dyn BookingRepository>,
    classes: Arc<dyn ClassRepository>,
    users: Arc<dyn UserRepository>,
    cache: Arc<DataCache>,
    dispatcher: Arc<NotificationDispatcher>,
    templates: Arc<NotificationTemplates>,
    class_locks: KeyedLocks,
    settings: ReservationSettings,
}

impl ReservationEngine {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        classes: Arc<dyn ClassRepository>,
        users: Arc<dyn UserRepository>,
        cache: Arc<DataCache>,
        dispatcher: Arc<NotificationDispatcher>,
        templates: Arc<NotificationTemplates>,
        settings: ReservationSettings,
    ) -> Self {
        Self {
            bookings,
            classes,
            users,
            cache,
            dispatcher,
            templates,
            class_locks: KeyedLocks::new(),
            settings,
        }
    }

    pub async fn reserve(&self, user_id: &str, class_id: &str) -> Result<Reservation, AppError> {
        let result = self.admit(user_id, class_id).await;
        match &result {
            Ok(r) => {
                metrics::record_reservation("admitted");
                info!(reservation_id = %r.id, user_id = %user_id, class_id = %class_id, "Reservation admitted");
            }
            Err(e) => {
                metrics::record_reservation(e.metric_label());
                info!(user_id = %user_id, class_id = %class_id, reason = e.metric_label(), "Reservation rejected");
            }
        }
        let reservation = result?;

        self.invalidate(user_id, class_id).await;
        self.notify_booked(&reservation).await;
        Ok(reservation)
    }

    /// Queueing for the class lock and every conflict retry share one
    /// deadline.
    async fn admit(&self, user_id: &str, class_id: &str) -> Result<Reservation, AppError> {
        self.with_deadline(async {
            let _class_guard = self.class_locks.acquire(class_id).await;

            let mut attempt: u32 = 0;
            loop {
                attempt += 1;
                let candidate = Reservation::new(user_id, class_id);
                let today = Utc::now().date_naive();

                match self.bookings.reserve(&candidate, today).await {
                    Err(e) if e.is_serialization_conflict() && attempt <= self.settings.conflict_retries => {
                        warn!(attempt = attempt, class_id = %class_id, "Serialization conflict during admission, retrying: {}", e);
                        tokio::time::sleep(CONFLICT_BACKOFF_STEP * attempt).await;
                    }
                    other => return other,
                }
            }
        }).await
    }

    /// booked -> cancelled for the owner. A second cancel of the same
    /// reservation returns `AlreadyCancelled` and changes nothing.
    pub async fn cancel(&self, reservation_id: &str, user_id: &str) -> Result<CancelOutcome, AppError> {
        let outcome = self.with_deadline(self.bookings.cancel(reservation_id, user_id, Utc::now())).await?;

        match &outcome {
            CancelOutcome::Cancelled(r) => {
                info!(reservation_id = %r.id, class_id = %r.class_id, "Reservation cancelled");
                self.invalidate(user_id, &r.class_id).await;
                self.notify_cancelled(r).await;
            }
            CancelOutcome::AlreadyCancelled(r) => {
                info!(reservation_id = %r.id, "Reservation was already cancelled");
            }
        }
        Ok(outcome)
    }

    async fn with_deadline<T>(&self, work: impl Future<Output = Result<T, AppError>>) -> Result<T, AppError> {
        tokio::time::timeout(self.settings.tx_timeout, work)
            .await
            .map_err(|_| AppError::Persistence(format!("store transaction exceeded {}ms", self.settings.tx_timeout.as_millis())))?
    }

    async fn invalidate(&self, user_id: &str, class_id: &str) {
        self.cache.invalidate(&[
            keys::class(class_id),
            keys::CLASSES_ALL.to_string(),
            keys::class_bookings(class_id),
            keys::user_bookings(user_id),
        ]).await;
    }

    async fn notify_booked(&self, reservation: &Reservation) {
        if let Some((user, class)) = self.recipient_and_class(reservation).await {
            let job = self.templates.booking_confirmation(&user.email, &user.name, &class, reservation);
            self.enqueue(job, reservation).await;
        }
    }

    async fn notify_cancelled(&self, reservation: &Reservation) {
        if let Some((user, class)) = self.recipient_and_class(reservation).await {
            let job = self.templates.booking_cancellation(&user.email, &user.name, &class, reservation);
            self.enqueue(job, reservation).await;
        }
    }

    async fn recipient_and_class(&self, reservation: &Reservation) -> Option<(User, ClassSession)> {
        match (
            self.users.find_by_id(&reservation.user_id).await,
            self.classes.find_by_id(&reservation.class_id).await,
        ) {
            (Ok(Some(user)), Ok(Some(class))) => Some((user, class)),
            (u, c) => {
                warn!(reservation_id = %reservation.id, "Skipping notification, lookup failed: user={:?} class={:?}", u.err(), c.err());
                None
            }
        }
    }

    // Notification trouble is logged and never surfaces to the caller.
    async fn enqueue(&self, job: Result<NotificationJob, AppError>, reservation: &Reservation) {
        match job {
            Ok(job) => {
                let _ = self.dispatcher.enqueue(job).await;
            }
            Err(e) => warn!(reservation_id = %reservation.id, "Notification not rendered: {}", e),
        }
    }
}
