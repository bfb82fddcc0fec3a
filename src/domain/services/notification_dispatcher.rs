use crate::config::Config;
use crate::domain::models::notification::{DeliveryState, NotificationJob};
use crate::domain::ports::EmailService;
use crate::error::AppError;
use crate::metrics;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub capacity: usize,
    pub enqueue_timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub shutdown_timeout: Duration,
}

impl DispatcherSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            capacity: config.notification_queue_capacity.max(1),
            enqueue_timeout: config.notification_enqueue_timeout,
            max_attempts: config.notification_max_attempts.max(1),
            retry_delay: config.notification_retry_delay,
            shutdown_timeout: config.notification_shutdown_timeout,
        }
    }
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
    exhausted: AtomicU64,
    abandoned: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, outcome: &'static str) {
        Self::bump_by(counter, 1, outcome);
    }

    fn bump_by(counter: &AtomicU64, n: u64, outcome: &'static str) {
        if n == 0 {
            return;
        }
        counter.fetch_add(n, Ordering::Relaxed);
        metrics::record_notifications(outcome, n);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    pub enqueued: u64,
    pub delivered: u64,
    pub retried: u64,
    pub dropped: u64,
    pub exhausted: u64,
    pub abandoned: u64,
    pub queued: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Graceful,
    TimedOut,
}

/// Bounded queue drained by one background worker.
///
/// Delivery is best effort: a job gets at most `max_attempts` sends and is
/// then discarded. Producers wait at most `enqueue_timeout` for room.
pub struct NotificationDispatcher {
    tx: mpsc::Sender<NotificationJob>,
    stop: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
    settings: DispatcherSettings,
}

impl NotificationDispatcher {
    /// Spawns the worker on the current tokio runtime.
    pub fn start(channel: Arc<dyn EmailService>, settings: DispatcherSettings) -> Self {
        let (tx, rx) = mpsc::channel(settings.capacity);
        let (stop, stop_rx) = watch::channel(false);
        let counters = Arc::new(Counters::default());

        let worker = Worker {
            rx,
            stop: stop_rx,
            channel,
            counters: counters.clone(),
            max_attempts: settings.max_attempts.max(1),
            retry_delay: settings.retry_delay,
        };
        let handle = tokio::spawn(worker.run());
        info!(capacity = settings.capacity, "Notification dispatcher started");

        Self {
            tx,
            stop,
            worker: Mutex::new(Some(handle)),
            counters,
            settings,
        }
    }

    /// Never blocks longer than the enqueue timeout. A full queue, or one that
    /// has been shut down, drops the job and reports `QueueSaturated`.
    pub async fn enqueue(&self, job: NotificationJob) -> Result<(), AppError> {
        if *self.stop.borrow() {
            return Err(self.drop_job(&job, "dispatcher stopped"));
        }

        match self.tx.send_timeout(job, self.settings.enqueue_timeout).await {
            Ok(()) => {
                Counters::bump(&self.counters.enqueued, "enqueued");
                Ok(())
            }
            Err(SendTimeoutError::Timeout(job)) => Err(self.drop_job(&job, "queue full")),
            Err(SendTimeoutError::Closed(job)) => Err(self.drop_job(&job, "worker gone")),
        }
    }

    fn drop_job(&self, job: &NotificationJob, reason: &str) -> AppError {
        warn!(job_id = %job.id, recipient = %job.recipient, reason = reason, "Dropping notification");
        Counters::bump(&self.counters.dropped, "dropped");
        AppError::QueueSaturated
    }

    pub fn stats(&self) -> DispatcherStats {
        let c = &self.counters;
        DispatcherStats {
            enqueued: c.enqueued.load(Ordering::Relaxed),
            delivered: c.delivered.load(Ordering::Relaxed),
            retried: c.retried.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            exhausted: c.exhausted.load(Ordering::Relaxed),
            abandoned: c.abandoned.load(Ordering::Relaxed),
            queued: self.queued(),
        }
    }

    fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Signals the worker and waits up to the shutdown timeout for it to
    /// finish its current job. Safe to call more than once.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        self.stop.send_replace(true);

        let handle = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(mut handle) = handle else {
            return ShutdownOutcome::Graceful;
        };

        match tokio::time::timeout(self.settings.shutdown_timeout, &mut handle).await {
            Ok(_) => {
                info!("Notification dispatcher stopped");
                ShutdownOutcome::Graceful
            }
            Err(_) => {
                warn!(timeout_ms = self.settings.shutdown_timeout.as_millis() as u64, "Notification worker did not stop in time, aborting it");
                handle.abort();
                let _ = handle.await;
                // The aborted worker never reaches its own accounting: every
                // accepted job without an outcome was lost with it.
                let c = &self.counters;
                let settled = c.delivered.load(Ordering::Relaxed)
                    + c.exhausted.load(Ordering::Relaxed)
                    + c.abandoned.load(Ordering::Relaxed);
                let lost = c.enqueued.load(Ordering::Relaxed).saturating_sub(settled);
                Counters::bump_by(&c.abandoned, lost, "abandoned");
                ShutdownOutcome::TimedOut
            }
        }
    }
}

struct Worker {
    rx: mpsc::Receiver<NotificationJob>,
    stop: watch::Receiver<bool>,
    channel: Arc<dyn EmailService>,
    counters: Arc<Counters>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl Worker {
    async fn run(mut self) {
        loop {
            if *self.stop.borrow() {
                break;
            }
            let job = tokio::select! {
                biased;
                _ = self.stop.changed() => break,
                job = self.rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            let span = info_span!("notification", job_id = %job.id, recipient = %job.recipient);
            self.deliver(job).instrument(span).await;
        }

        let left = self.rx.len();
        if left > 0 {
            warn!(count = left, "Discarding queued notifications on shutdown");
            Counters::bump_by(&self.counters.abandoned, left as u64, "abandoned");
        }
        info!("Notification worker exited");
    }

    async fn deliver(&mut self, mut job: NotificationJob) {
        loop {
            job.advance(DeliveryState::Delivering);
            job.attempts += 1;

            let err = match self.channel.send(&job.recipient, &job.subject, &job.body).await {
                Ok(()) => {
                    job.advance(DeliveryState::Delivered);
                    Counters::bump(&self.counters.delivered, "delivered");
                    info!(attempts = job.attempts, "Notification delivered");
                    return;
                }
                Err(e) => e,
            };

            if job.attempts >= self.max_attempts {
                job.advance(DeliveryState::Exhausted);
                Counters::bump(&self.counters.exhausted, "exhausted");
                error!(attempts = job.attempts, "Notification exhausted retries: {}", err);
                return;
            }

            job.advance(DeliveryState::Retrying);
            Counters::bump(&self.counters.retried, "retried");
            warn!(attempt = job.attempts, "Notification delivery failed, retrying: {}", err);

            tokio::select! {
                biased;
                _ = self.stop.changed() => {
                    job.advance(DeliveryState::Abandoned);
                    Counters::bump(&self.counters.abandoned, "abandoned");
                    warn!(attempts = job.attempts, "Stop requested during retry wait, abandoning notification");
                    return;
                }
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
        }
    }
}
