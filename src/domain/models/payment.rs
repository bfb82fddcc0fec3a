use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::error::AppError;

pub const PAYMENT_COMPLETED: &str = "completed";
pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_FAILED: &str = "failed";

/// Validates a status filter against the statuses the store allows.
pub fn payment_status(value: &str) -> Result<&'static str, AppError> {
    [PAYMENT_COMPLETED, PAYMENT_PENDING, PAYMENT_FAILED]
        .into_iter()
        .find(|s| *s == value)
        .ok_or_else(|| AppError::Validation(format!("Unknown payment status: {}", value)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
    BankTransfer,
    QrCode,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::QrCode => "qr_code",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "cash" => Ok(PaymentMethod::Cash),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "qr_code" => Ok(PaymentMethod::QrCode),
            other => Err(AppError::Validation(format!("Invalid payment method: {}", other))),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub method: String,
    pub status: String,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewPaymentParams {
    pub user_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub description: Option<String>,
    pub reference_id: Option<String>,
}

impl Payment {
    pub fn completed(params: NewPaymentParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: params.user_id,
            amount_cents: params.amount_cents,
            currency: params.currency,
            method: params.method.to_string(),
            status: PAYMENT_COMPLETED.to_string(),
            description: params.description,
            reference_id: params.reference_id,
            created_at: Utc::now(),
        }
    }
}
