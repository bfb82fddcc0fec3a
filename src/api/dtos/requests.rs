use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateClassRequest {
    pub title: String,
    pub description: Option<String>,
    pub trainer_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_min: i32,
    pub capacity: i32,
}

#[derive(Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
    pub duration_days: i32,
    pub price_cents: i64,
}

#[derive(Deserialize)]
pub struct PurchaseRequest {
    pub payment_method: String,
}

#[derive(Deserialize)]
pub struct CreateTrainerRequest {
    pub name: String,
    pub bio: Option<String>,
}

/// `?status=` on listing endpoints.
#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct FlushCacheRequest {
    pub prefix: String,
}
