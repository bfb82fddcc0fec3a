use crate::domain::{
    models::{membership::{MembershipGrant, MembershipPlan}, payment::Payment},
    ports::MembershipRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub struct SqliteMembershipRepo {
    pool: SqlitePool,
}

impl SqliteMembershipRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for SqliteMembershipRepo {
    async fn create_plan(&self, plan: &MembershipPlan) -> Result<MembershipPlan, AppError> {
        sqlx::query_as::<_, MembershipPlan>(
            "INSERT INTO membership_plans (id, name, duration_days, price_cents, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&plan.id)
            .bind(&plan.name)
            .bind(plan.duration_days)
            .bind(plan.price_cents)
            .bind(plan.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_plan(&self, id: &str) -> Result<Option<MembershipPlan>, AppError> {
        sqlx::query_as::<_, MembershipPlan>("SELECT * FROM membership_plans WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_plans(&self) -> Result<Vec<MembershipPlan>, AppError> {
        sqlx::query_as::<_, MembershipPlan>("SELECT * FROM membership_plans ORDER BY duration_days ASC, name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn record_purchase(&self, payment: &Payment, grant: &MembershipGrant) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query(
            r#"INSERT INTO payments (id, user_id, amount_cents, currency, method, status, description, reference_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
            .bind(&payment.id)
            .bind(&payment.user_id)
            .bind(payment.amount_cents)
            .bind(&payment.currency)
            .bind(&payment.method)
            .bind(&payment.status)
            .bind(&payment.description)
            .bind(&payment.reference_id)
            .bind(payment.created_at)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query(
            r#"INSERT INTO user_memberships (id, user_id, plan_id, payment_id, start_date, end_date, active, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#
        )
            .bind(&grant.id)
            .bind(&grant.user_id)
            .bind(&grant.plan_id)
            .bind(&grant.payment_id)
            .bind(grant.start_date)
            .bind(grant.end_date)
            .bind(grant.active)
            .bind(grant.created_at)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn has_active_membership(&self, user_id: &str, day: NaiveDate) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM user_memberships WHERE user_id = ? AND active = ? AND start_date <= ? AND end_date >= ?"
        )
            .bind(user_id)
            .bind(true)
            .bind(day)
            .bind(day)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(count > 0)
    }

    async fn find_current_grant(&self, user_id: &str, day: NaiveDate) -> Result<Option<MembershipGrant>, AppError> {
        // Latest-ending grant wins when several overlap.
        sqlx::query_as::<_, MembershipGrant>(
            r#"SELECT * FROM user_memberships
               WHERE user_id = ? AND active = ? AND start_date <= ? AND end_date >= ?
               ORDER BY end_date DESC LIMIT 1"#
        )
            .bind(user_id)
            .bind(true)
            .bind(day)
            .bind(day)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_grants(&self, user_id: &str) -> Result<Vec<MembershipGrant>, AppError> {
        sqlx::query_as::<_, MembershipGrant>("SELECT * FROM user_memberships WHERE user_id = ? ORDER BY start_date DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
