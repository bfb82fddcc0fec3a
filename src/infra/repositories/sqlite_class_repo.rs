use crate::domain::{models::class::ClassSession, ports::ClassRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteClassRepo {
    pool: SqlitePool,
}

impl SqliteClassRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClassRepository for SqliteClassRepo {
    async fn create(&self, class: &ClassSession) -> Result<ClassSession, AppError> {
        sqlx::query_as::<_, ClassSession>(
            r#"INSERT INTO classes (id, title, description, trainer_id, start_time, duration_min, capacity, booked_count, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?) RETURNING *"#
        )
            .bind(&class.id)
            .bind(&class.title)
            .bind(&class.description)
            .bind(&class.trainer_id)
            .bind(class.start_time)
            .bind(class.duration_min)
            .bind(class.capacity)
            .bind(class.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ClassSession>, AppError> {
        sqlx::query_as::<_, ClassSession>("SELECT * FROM classes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<ClassSession>, AppError> {
        sqlx::query_as::<_, ClassSession>("SELECT * FROM classes ORDER BY start_time ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
