use crate::domain::{models::booking::{Reservation, CancelOutcome}, ports::BookingRepository};
use crate::error::AppError;
use crate::infra::repositories::map_admission_error;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, NaiveDate, Utc};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn reserve(&self, reservation: &Reservation, today: NaiveDate) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Row lock on the class serializes admission per class across every
        // process sharing this database.
        let class_row: Option<(i32, i32)> = sqlx::query_as("SELECT capacity, booked_count FROM classes WHERE id = $1 FOR UPDATE")
            .bind(&reservation.class_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        let (capacity, booked_count) = class_row.ok_or_else(|| AppError::ClassNotFound(reservation.class_id.clone()))?;
        if booked_count >= capacity {
            return Err(AppError::ClassFull);
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM user_memberships WHERE user_id = $1 AND active = $2 AND start_date <= $3 AND end_date >= $3"
        )
            .bind(&reservation.user_id).bind(true).bind(today)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if active == 0 {
            return Err(AppError::NoActiveMembership);
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM bookings WHERE user_id = $1 AND class_id = $2 AND status = 'booked'")
            .bind(&reservation.user_id).bind(&reservation.class_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if existing > 0 {
            return Err(AppError::AlreadyBooked);
        }

        let created = sqlx::query_as::<_, Reservation>(
            "INSERT INTO bookings (id, user_id, class_id, status, created_at, cancelled_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *"
        )
            .bind(&reservation.id).bind(&reservation.user_id).bind(&reservation.class_id)
            .bind(&reservation.status).bind(reservation.created_at).bind(reservation.cancelled_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_admission_error)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn cancel(&self, reservation_id: &str, user_id: &str, at: DateTime<Utc>) -> Result<CancelOutcome, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let cancelled = sqlx::query_as::<_, Reservation>(
            "UPDATE bookings SET status = 'cancelled', cancelled_at = $1 WHERE id = $2 AND user_id = $3 AND status = 'booked' RETURNING *"
        )
            .bind(at).bind(reservation_id).bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if let Some(reservation) = cancelled {
            tx.commit().await.map_err(AppError::Database)?;
            return Ok(CancelOutcome::Cancelled(reservation));
        }

        let existing = sqlx::query_as::<_, Reservation>("SELECT * FROM bookings WHERE id = $1")
            .bind(reservation_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        tx.rollback().await.map_err(AppError::Database)?;

        match existing {
            None => Err(AppError::NotFound("Reservation not found".into())),
            Some(r) if r.user_id != user_id => Err(AppError::Forbidden("Reservation belongs to another user".into())),
            Some(r) => Ok(CancelOutcome::AlreadyCancelled(r)),
        }
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC").bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_class(&self, class_id: &str) -> Result<Vec<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM bookings WHERE class_id = $1 ORDER BY created_at ASC").bind(class_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_all(&self, status: Option<&str>) -> Result<Vec<Reservation>, AppError> {
        let rows = match status {
            Some(status) => sqlx::query_as::<_, Reservation>("SELECT * FROM bookings WHERE status = $1 ORDER BY created_at DESC")
                .bind(status)
                .fetch_all(&self.pool)
                .await,
            None => sqlx::query_as::<_, Reservation>("SELECT * FROM bookings ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await,
        };
        rows.map_err(AppError::Database)
    }

    async fn count_booked(&self, class_id: &str) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE class_id = $1 AND status = 'booked'")
            .bind(class_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
