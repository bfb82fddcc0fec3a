mod common;

use common::TestApp;
use gym_booking::domain::ports::CacheStore;
use gym_booking::domain::services::session_store::SessionStore;
use gym_booking::infra::cache::data_cache::{keys, ttl, DataCache};
use gym_booking::infra::cache::memory::InMemoryCache;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_reads_respect_ttl_bound() {
    let cache = DataCache::new(Arc::new(InMemoryCache::new()));
    cache.set(&keys::user_bookings("u1"), &vec!["r1".to_string()], ttl::BOOKINGS).await;

    tokio::time::advance(ttl::BOOKINGS - Duration::from_secs(1)).await;
    assert!(cache.get::<Vec<String>>(&keys::user_bookings("u1")).await.is_some());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(cache.get::<Vec<String>>(&keys::user_bookings("u1")).await.is_none());

    let stats = cache.stats().await;
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn test_sessions_expire_with_their_ttl() {
    let cache = Arc::new(DataCache::new(Arc::new(InMemoryCache::new())));
    let sessions = SessionStore::new(cache.clone(), Duration::from_secs(60));

    let session = sessions.create_session("u1", "u1@gym.test", false).await;
    assert_eq!(sessions.get_session(&session.id).await.unwrap().user_id, "u1");

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(sessions.get_session(&session.id).await.is_none());
    assert!(sessions.get_user_session("u1").await.is_none());
    assert_eq!(cache.store().purge_expired().await, 0);
}

#[tokio::test]
async fn test_catalog_is_stale_until_invalidated() {
    let app = TestApp::new().await;
    let class = app.seed_class("Morning Yoga", 10).await;

    assert_eq!(app.state.catalog.get_class(&class.id).await.unwrap().title, "Morning Yoga");

    // An out-of-band write is not visible while the entry lives.
    sqlx::query("UPDATE classes SET title = 'Evening Yoga' WHERE id = ?")
        .bind(&class.id)
        .execute(&app.pool)
        .await
        .unwrap();
    assert_eq!(app.state.catalog.get_class(&class.id).await.unwrap().title, "Morning Yoga");

    app.state.cache.invalidate(&[keys::class(&class.id)]).await;
    assert_eq!(app.state.catalog.get_class(&class.id).await.unwrap().title, "Evening Yoga");
}

#[tokio::test]
async fn test_admin_writes_invalidate_lists() {
    let app = TestApp::new().await;
    assert!(app.state.catalog.list_classes().await.unwrap().is_empty());
    assert!(app.state.catalog.list_plans().await.unwrap().is_empty());

    app.seed_class("Spin", 8).await;
    app.seed_plan(30, 1500).await;

    assert_eq!(app.state.catalog.list_classes().await.unwrap().len(), 1);
    assert_eq!(app.state.catalog.list_plans().await.unwrap().len(), 1);

    let stats = app.state.cache.stats().await;
    assert!(stats.misses >= 4);
    assert!(app.state.cache.store().get(keys::CLASSES_ALL).await.is_some());
}
