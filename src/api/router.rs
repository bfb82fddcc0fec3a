use axum::{
    body::Body,
    extract::Request,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, auth, booking, class, health, membership, payment, trainer};
use crate::api::middleware::rate_limit;
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))

        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/me", get(auth::me))

        // Trainers
        .route("/api/v1/trainers", get(trainer::list_trainers).post(trainer::create_trainer))
        .route("/api/v1/trainers/{trainer_id}", get(trainer::get_trainer))

        // Classes
        .route("/api/v1/classes", get(class::list_classes).post(class::create_class))
        .route("/api/v1/classes/{class_id}", get(class::get_class))
        .route("/api/v1/classes/{class_id}/bookings", get(class::class_bookings))
        .route("/api/v1/classes/{class_id}/book", post(class::book_class))

        // Reservations
        .route("/api/v1/bookings", get(booking::my_bookings))
        .route("/api/v1/bookings/{reservation_id}/cancel", post(booking::cancel_booking))

        // Memberships & Payments
        .route("/api/v1/memberships", get(membership::list_plans).post(membership::create_plan))
        .route("/api/v1/memberships/me", get(membership::my_membership))
        .route("/api/v1/memberships/{plan_id}", get(membership::get_plan))
        .route("/api/v1/memberships/{plan_id}/purchase", post(membership::purchase))
        .route("/api/v1/payments", get(payment::my_payments))
        .route("/api/v1/payments/{payment_id}", get(payment::get_payment))

        // Admin
        .route("/api/v1/admin/stats", get(admin::stats))
        .route("/api/v1/admin/payments", get(admin::all_payments))
        .route("/api/v1/admin/bookings", get(admin::all_bookings))
        .route("/api/v1/admin/cache/flush", post(admin::flush_cache))

        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
