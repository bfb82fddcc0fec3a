mod common;

use chrono::{Days, Utc};
use common::{eventually, TestApp};
use gym_booking::error::{AppError, ErrorKind};

#[tokio::test]
async fn test_purchase_thirty_day_plan() {
    let app = TestApp::new().await;
    let user = app.seed_user("buyer").await;
    let plan = app.seed_plan(30, 1500).await;

    let today = Utc::now().date_naive();
    let receipt = app.state.ledger.purchase(&user.id, &plan.id, "card").await.unwrap();

    assert_eq!(receipt.amount_cents, 1500);
    assert_eq!(receipt.currency, "KZT");
    assert_eq!(receipt.grant_start, today);
    assert_eq!(receipt.grant_end, today.checked_add_days(Days::new(30)).unwrap());

    let payment = app.state.payment_repo.find_by_id(&receipt.payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, "completed");
    assert_eq!(payment.method, "card");
    assert_eq!(payment.amount_cents, 1500);

    let grants = app.state.ledger.list_grants(&user.id).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].id, receipt.grant_id);
    assert_eq!(grants[0].payment_id.as_deref(), Some(receipt.payment_id.as_str()));
    assert!(grants[0].covers(today));
    assert!(app.state.membership_repo.has_active_membership(&user.id, today).await.unwrap());

    let mailer = app.mailer.clone();
    assert!(eventually(|| mailer.sent_subjects().iter().any(|s| s.starts_with("Membership activated"))).await);
}

#[tokio::test]
async fn test_failed_grant_insert_rolls_back_payment() {
    let app = TestApp::new().await;
    let user = app.seed_user("unlucky").await;
    let plan = app.seed_plan(30, 1500).await;

    // Fail the second insert of the purchase for this user only.
    sqlx::query(&format!(
        "CREATE TRIGGER fail_grant BEFORE INSERT ON user_memberships WHEN NEW.user_id = '{}' BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
        user.id
    ))
        .execute(&app.pool)
        .await
        .unwrap();

    let err = app.state.ledger.purchase(&user.id, &plan.id, "cash").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(err.is_retryable());

    let payments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE user_id = ?")
        .bind(&user.id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(payments, 0);
    assert!(app.state.ledger.list_grants(&user.id).await.unwrap().is_empty());
    assert!(!app.state.membership_repo.has_active_membership(&user.id, Utc::now().date_naive()).await.unwrap());
}

#[tokio::test]
async fn test_rejects_bad_method_and_unknown_plan() {
    let app = TestApp::new().await;
    let user = app.seed_user("careful").await;
    let plan = app.seed_plan(7, 500).await;

    let bad_method = app.state.ledger.purchase(&user.id, &plan.id, "bitcoin").await;
    assert!(matches!(bad_method, Err(AppError::Validation(_))));

    let unknown = app.state.ledger.purchase(&user.id, "missing-plan", "card").await;
    assert!(matches!(unknown, Err(AppError::PlanNotFound(_))));

    assert!(app.state.payment_repo.list_by_user(&user.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_purchase_refreshes_cached_membership_and_payments() {
    let app = TestApp::new().await;
    let user = app.seed_user("cached").await;
    let plan = app.seed_plan(30, 1500).await;

    assert!(app.state.catalog.current_membership(&user.id).await.unwrap().is_none());
    assert!(app.state.catalog.user_payments(&user.id, None).await.unwrap().is_empty());

    let receipt = app.state.ledger.purchase(&user.id, &plan.id, "qr_code").await.unwrap();

    let current = app.state.catalog.current_membership(&user.id).await.unwrap().unwrap();
    assert_eq!(current.id, receipt.grant_id);
    let payments = app.state.catalog.user_payments(&user.id, None).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].method, "qr_code");
}

#[tokio::test]
async fn test_overlapping_grants_are_kept() {
    let app = TestApp::new().await;
    let user = app.seed_user("loyal").await;
    let month = app.seed_plan(30, 1500).await;
    let year = app.seed_plan(365, 12000).await;

    app.state.ledger.purchase(&user.id, &month.id, "card").await.unwrap();
    let yearly = app.state.ledger.purchase(&user.id, &year.id, "bank_transfer").await.unwrap();

    assert_eq!(app.state.ledger.list_grants(&user.id).await.unwrap().len(), 2);
    let today = Utc::now().date_naive();
    let current = app.state.membership_repo.find_current_grant(&user.id, today).await.unwrap().unwrap();
    assert_eq!(current.id, yearly.grant_id);

    let completed = app.state.payment_repo.list_by_user(&user.id, Some("completed")).await.unwrap();
    assert_eq!(completed.len(), 2);
    assert!(app.state.payment_repo.list_by_user(&user.id, Some("failed")).await.unwrap().is_empty());
}
