use crate::domain::{models::trainer::Trainer, ports::TrainerRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteTrainerRepo {
    pool: SqlitePool,
}

impl SqliteTrainerRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrainerRepository for SqliteTrainerRepo {
    async fn create(&self, trainer: &Trainer) -> Result<Trainer, AppError> {
        sqlx::query_as::<_, Trainer>("INSERT INTO trainers (id, name, bio, created_at) VALUES (?, ?, ?, ?) RETURNING *")
            .bind(&trainer.id)
            .bind(&trainer.name)
            .bind(&trainer.bio)
            .bind(trainer.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Trainer>, AppError> {
        sqlx::query_as::<_, Trainer>("SELECT * FROM trainers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Trainer>, AppError> {
        sqlx::query_as::<_, Trainer>("SELECT * FROM trainers ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
