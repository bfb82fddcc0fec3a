use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Coarse classification used by callers that only care about the category
/// of a failure (retry decisions, HTTP mapping, metrics labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    CapacityExceeded,
    PreconditionFailed,
    Conflict,
    Persistence,
    QueueSaturated,
    RateLimited,
    Unauthorized,
    Forbidden,
    Validation,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Class {0} not found")]
    ClassNotFound(String),
    #[error("Membership plan {0} not found")]
    PlanNotFound(String),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Class is full")]
    ClassFull,
    #[error("No active membership found")]
    NoActiveMembership,
    #[error("Already booked for this class")]
    AlreadyBooked,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Notification queue saturated")]
    QueueSaturated,
    #[error("Too many requests")]
    RateLimited,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Database(_) | AppError::Persistence(_) => ErrorKind::Persistence,
            AppError::ClassNotFound(_) | AppError::PlanNotFound(_) | AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::ClassFull => ErrorKind::CapacityExceeded,
            AppError::NoActiveMembership | AppError::AlreadyBooked => ErrorKind::PreconditionFailed,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::QueueSaturated => ErrorKind::QueueSaturated,
            AppError::RateLimited => ErrorKind::RateLimited,
            AppError::Unauthorized => ErrorKind::Unauthorized,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Internal | AppError::InternalWithMsg(_) => ErrorKind::Internal,
        }
    }

    /// Store failures are safe for the caller to retry; nothing else is.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }

    /// SQLite busy/locked (5, 6, 261, 262, 517) or PostgreSQL
    /// serialization_failure / deadlock_detected.
    pub fn is_serialization_conflict(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => {
                let code = db_err.code().unwrap_or_default();
                matches!(code.as_ref(), "5" | "6" | "261" | "262" | "517" | "40001" | "40P01")
            }
            _ => false,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    pub fn is_check_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => db_err.is_check_violation(),
            _ => false,
        }
    }

    pub fn metric_label(&self) -> &'static str {
        match self {
            AppError::ClassNotFound(_) => "class_not_found",
            AppError::PlanNotFound(_) => "plan_not_found",
            AppError::ClassFull => "class_full",
            AppError::NoActiveMembership => "no_active_membership",
            AppError::AlreadyBooked => "already_booked",
            other => match other.kind() {
                ErrorKind::NotFound => "not_found",
                ErrorKind::Persistence => "persistence",
                ErrorKind::Conflict => "conflict",
                ErrorKind::Validation => "validation",
                ErrorKind::Forbidden => "forbidden",
                ErrorKind::RateLimited => "rate_limited",
                _ => "other",
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::CapacityExceeded | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            ErrorKind::Persistence => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::QueueSaturated | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                "Storage temporarily unavailable, retry later".to_string()
            }
            AppError::Persistence(msg) => {
                error!("Persistence error: {}", msg);
                "Storage temporarily unavailable, retry later".to_string()
            }
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                "Internal error".to_string()
            }
            AppError::Internal | AppError::QueueSaturated => "Internal error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        if matches!(status, StatusCode::SERVICE_UNAVAILABLE | StatusCode::TOO_MANY_REQUESTS) {
            return (status, [(header::RETRY_AFTER, "1")], body).into_response();
        }
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_and_retryability() {
        assert_eq!(AppError::ClassFull.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(AppError::AlreadyBooked.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(AppError::NoActiveMembership.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(AppError::PlanNotFound("p".into()).kind(), ErrorKind::NotFound);
        assert!(AppError::Persistence("deadline".into()).is_retryable());
        assert!(AppError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!AppError::ClassFull.is_retryable());
        assert!(!AppError::Database(sqlx::Error::PoolTimedOut).is_serialization_conflict());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::ClassFull.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NoActiveMembership.into_response().status(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(AppError::ClassNotFound("x".into()).into_response().status(), StatusCode::NOT_FOUND);

        let res = AppError::Persistence("down".into()).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(res.headers().contains_key(header::RETRY_AFTER));

        let res = AppError::RateLimited.into_response();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()[header::RETRY_AFTER], "1");
        assert!(!AppError::RateLimited.is_retryable());
    }
}
