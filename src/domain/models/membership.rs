use serde::{Deserialize, Serialize};
use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct MembershipPlan {
    pub id: String,
    pub name: String,
    pub duration_days: i32,
    /// Minor currency units.
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl MembershipPlan {
    pub fn new(name: String, duration_days: i32, price_cents: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            duration_days,
            price_cents,
            created_at: Utc::now(),
        }
    }
}

/// A user's entitlement window. Several grants may overlap; a user "has an
/// active membership" when any one of them covers the day in question.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct MembershipGrant {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub payment_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl MembershipGrant {
    pub fn new(user_id: &str, plan_id: &str, payment_id: Option<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            plan_id: plan_id.to_string(),
            payment_id,
            start_date,
            end_date,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn covers(&self, day: NaiveDate) -> bool {
        self.active && self.start_date <= day && day <= self.end_date
    }
}

/// Calendar-day window starting on `purchase_day`: time of day plays no part.
pub fn grant_window(purchase_day: NaiveDate, duration_days: i32) -> Result<(NaiveDate, NaiveDate), AppError> {
    if duration_days <= 0 {
        return Err(AppError::Validation("Plan duration must be positive".into()));
    }
    let end = purchase_day
        .checked_add_days(Days::new(duration_days as u64))
        .ok_or(AppError::Validation("Plan duration out of range".into()))?;
    Ok((purchase_day, end))
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub payment_id: String,
    pub grant_id: String,
    pub plan_id: String,
    pub grant_start: NaiveDate,
    pub grant_end: NaiveDate,
    pub amount_cents: i64,
    pub currency: String,
}
