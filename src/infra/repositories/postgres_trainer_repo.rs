use crate::domain::{models::trainer::Trainer, ports::TrainerRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresTrainerRepo {
    pool: PgPool,
}

impl PostgresTrainerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrainerRepository for PostgresTrainerRepo {
    async fn create(&self, trainer: &Trainer) -> Result<Trainer, AppError> {
        sqlx::query_as::<_, Trainer>("INSERT INTO trainers (id, name, bio, created_at) VALUES ($1, $2, $3, $4) RETURNING *")
            .bind(&trainer.id)
            .bind(&trainer.name)
            .bind(&trainer.bio)
            .bind(trainer.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Trainer>, AppError> {
        sqlx::query_as::<_, Trainer>("SELECT * FROM trainers WHERE id = $1")
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
