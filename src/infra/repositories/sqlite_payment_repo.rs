use crate::domain::{models::payment::Payment, ports::PaymentRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqlitePaymentRepo {
    pool: SqlitePool,
}

impl SqlitePaymentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str, status: Option<&str>) -> Result<Vec<Payment>, AppError> {
        let mut query = "SELECT * FROM payments WHERE user_id = ?".to_string();
        if status.is_some() {
            query.push_str(" AND status = ?");
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, Payment>(&query).bind(user_id);
        if let Some(s) = status {
            q = q.bind(s);
        }
        q.fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_all(&self, status: Option<&str>) -> Result<Vec<Payment>, AppError> {
        let rows = match status {
            Some(status) => sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE status = ? ORDER BY created_at DESC")
                .bind(status)
                .fetch_all(&self.pool)
                .await,
            None => sqlx::query_as::<_, Payment>("SELECT * FROM payments ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await,
        };
        rows.map_err(AppError::Database)
    }
}
