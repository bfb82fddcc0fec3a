use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A scheduled class with a hard seat limit.
///
/// `booked_count` is maintained by the store itself (trigger on `bookings`)
/// and guarded by `CHECK (booked_count <= capacity)`; application code reads
/// it but never writes it.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct ClassSession {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub trainer_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_min: i32,
    pub capacity: i32,
    pub booked_count: i32,
    pub created_at: DateTime<Utc>,
}

pub struct NewClassParams {
    pub title: String,
    pub description: Option<String>,
    pub trainer_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_min: i32,
    pub capacity: i32,
}

impl ClassSession {
    pub fn new(params: NewClassParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: params.title,
            description: params.description,
            trainer_id: params.trainer_id,
            start_time: params.start_time,
            duration_min: params.duration_min,
            capacity: params.capacity,
            booked_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(self.duration_min as i64)
    }

    pub fn available_seats(&self) -> i32 {
        (self.capacity - self.booked_count).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.booked_count >= self.capacity
    }
}
