use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use crate::error::AppError;

pub const STATUS_BOOKED: &str = "booked";
pub const STATUS_CANCELLED: &str = "cancelled";

pub fn reservation_status(value: &str) -> Result<&'static str, AppError> {
    [STATUS_BOOKED, STATUS_CANCELLED]
        .into_iter()
        .find(|s| *s == value)
        .ok_or_else(|| AppError::Validation(format!("Unknown reservation status: {}", value)))
}

/// A seat held by a user in a class. Cancellation flips `status`; rows are
/// never deleted.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    pub class_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn new(user_id: &str, class_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            class_id: class_id.to_string(),
            status: STATUS_BOOKED.to_string(),
            created_at: Utc::now(),
            cancelled_at: None,
        }
    }

    pub fn is_booked(&self) -> bool {
        self.status == STATUS_BOOKED
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    Cancelled(Reservation),
    AlreadyCancelled(Reservation),
}

impl CancelOutcome {
    pub fn reservation(&self) -> &Reservation {
        match self {
            CancelOutcome::Cancelled(r) | CancelOutcome::AlreadyCancelled(r) => r,
        }
    }

    pub fn into_reservation(self) -> Reservation {
        match self {
            CancelOutcome::Cancelled(r) | CancelOutcome::AlreadyCancelled(r) => r,
        }
    }
}
