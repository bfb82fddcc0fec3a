use crate::error::AppError;

pub mod sqlite_user_repo;
pub mod sqlite_class_repo;
pub mod sqlite_trainer_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_membership_repo;
pub mod sqlite_payment_repo;

pub mod postgres_user_repo;
pub mod postgres_class_repo;
pub mod postgres_trainer_repo;
pub mod postgres_booking_repo;
pub mod postgres_membership_repo;
pub mod postgres_payment_repo;

/// Translates the store's own guards on the booking insert into domain
/// errors: the capacity CHECK on `classes` and the one-live-booking index.
pub(crate) fn map_admission_error(e: sqlx::Error) -> AppError {
    let err = AppError::Database(e);
    if err.is_check_violation() {
        AppError::ClassFull
    } else if err.is_unique_violation() {
        AppError::AlreadyBooked
    } else {
        err
    }
}
