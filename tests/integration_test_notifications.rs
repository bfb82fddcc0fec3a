mod common;

use common::{eventually, RecordingEmailService};
use gym_booking::domain::models::notification::NotificationJob;
use gym_booking::domain::services::notification_dispatcher::{DispatcherSettings, NotificationDispatcher, ShutdownOutcome};
use gym_booking::error::AppError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn settings() -> DispatcherSettings {
    DispatcherSettings {
        capacity: 100,
        enqueue_timeout: Duration::from_millis(200),
        max_attempts: 3,
        retry_delay: Duration::from_millis(10),
        shutdown_timeout: Duration::from_secs(2),
    }
}

fn job(n: usize) -> NotificationJob {
    NotificationJob::new(format!("member{}@gym.test", n), format!("subject {}", n), "<p>hi</p>")
}

#[tokio::test]
async fn test_delivers_in_order() {
    let mailer = Arc::new(RecordingEmailService::default());
    let dispatcher = NotificationDispatcher::start(mailer.clone(), settings());

    for n in 0..3 {
        dispatcher.enqueue(job(n)).await.unwrap();
    }

    let m = mailer.clone();
    assert!(eventually(|| m.sent.lock().unwrap().len() == 3).await);
    assert_eq!(mailer.sent_subjects(), vec!["subject 0", "subject 1", "subject 2"]);

    let stats = dispatcher.stats();
    assert_eq!(stats.enqueued, 3);
    assert_eq!(stats.delivered, 3);
    assert_eq!(stats.retried, 0);
    assert_eq!(dispatcher.shutdown().await, ShutdownOutcome::Graceful);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let mailer = Arc::new(RecordingEmailService::failing(2));
    let dispatcher = NotificationDispatcher::start(mailer.clone(), settings());

    dispatcher.enqueue(job(1)).await.unwrap();

    let m = mailer.clone();
    assert!(eventually(|| m.sent.lock().unwrap().len() == 1).await);
    assert_eq!(mailer.attempts.load(Ordering::SeqCst), 3);

    let stats = dispatcher.stats();
    assert_eq!(stats.retried, 2);
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.exhausted, 0);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let mailer = Arc::new(RecordingEmailService::failing(100));
    let dispatcher = NotificationDispatcher::start(mailer.clone(), settings());

    dispatcher.enqueue(job(1)).await.unwrap();
    dispatcher.enqueue(job(2)).await.unwrap();

    let d = &dispatcher;
    assert!(eventually(|| d.stats().exhausted == 2).await);
    assert_eq!(mailer.attempts.load(Ordering::SeqCst), 6);
    assert!(mailer.sent.lock().unwrap().is_empty());
    assert_eq!(dispatcher.stats().delivered, 0);
}

#[tokio::test]
async fn test_full_queue_drops_within_enqueue_timeout() {
    let mailer = Arc::new(RecordingEmailService::slow(Duration::from_secs(1)));
    let dispatcher = NotificationDispatcher::start(mailer.clone(), DispatcherSettings {
        capacity: 2,
        enqueue_timeout: Duration::from_millis(50),
        ..settings()
    });

    let mut dropped = 0;
    for n in 0..6 {
        let started = Instant::now();
        match dispatcher.enqueue(job(n)).await {
            Ok(()) => {}
            Err(AppError::QueueSaturated) => dropped += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
        assert!(started.elapsed() < Duration::from_millis(500), "enqueue blocked too long");
    }

    let stats = dispatcher.stats();
    assert!(dropped >= 1);
    assert_eq!(stats.dropped, dropped);
    assert_eq!(stats.enqueued + stats.dropped, 6);
    assert!(stats.queued <= 2);
}

#[tokio::test]
async fn test_stop_during_retry_wait_abandons_job() {
    let mailer = Arc::new(RecordingEmailService::failing(100));
    let dispatcher = NotificationDispatcher::start(mailer.clone(), DispatcherSettings {
        retry_delay: Duration::from_secs(30),
        ..settings()
    });

    dispatcher.enqueue(job(1)).await.unwrap();
    let m = mailer.clone();
    assert!(eventually(|| m.attempts.load(Ordering::SeqCst) == 1).await);

    let started = Instant::now();
    assert_eq!(dispatcher.shutdown().await, ShutdownOutcome::Graceful);
    assert!(started.elapsed() < Duration::from_secs(1));

    let stats = dispatcher.stats();
    assert_eq!(stats.abandoned, 1);
    assert_eq!(stats.exhausted, 0);
    assert_eq!(mailer.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_shutdown_gives_up_on_hung_delivery() {
    let mailer = Arc::new(RecordingEmailService::slow(Duration::from_secs(30)));
    let dispatcher = NotificationDispatcher::start(mailer.clone(), DispatcherSettings {
        shutdown_timeout: Duration::from_millis(100),
        ..settings()
    });

    for i in 0..3 {
        dispatcher.enqueue(job(i)).await.unwrap();
    }
    let m = mailer.clone();
    assert!(eventually(|| m.attempts.load(Ordering::SeqCst) == 1).await);

    assert_eq!(dispatcher.shutdown().await, ShutdownOutcome::TimedOut);

    // One job hung in delivery and two still queued are all written off.
    let stats = dispatcher.stats();
    assert_eq!(stats.abandoned, 3);
    assert_eq!(stats.delivered + stats.exhausted, 0);
}

#[tokio::test]
async fn test_enqueue_after_shutdown_is_dropped() {
    let mailer = Arc::new(RecordingEmailService::default());
    let dispatcher = NotificationDispatcher::start(mailer.clone(), settings());

    assert_eq!(dispatcher.shutdown().await, ShutdownOutcome::Graceful);
    assert_eq!(dispatcher.shutdown().await, ShutdownOutcome::Graceful);

    assert!(matches!(dispatcher.enqueue(job(1)).await, Err(AppError::QueueSaturated)));
    assert_eq!(dispatcher.stats().dropped, 1);
    assert!(mailer.sent.lock().unwrap().is_empty());
}
