use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::StatusQuery;
use crate::api::extractors::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub async fn my_payments(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.user_payments(&user.user_id, query.status.as_deref()).await?))
}

pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let payment = state.catalog.find_payment(&payment_id).await?;
    if payment.user_id != user.user_id && !user.is_admin {
        return Err(AppError::Forbidden("Payment belongs to another member".into()));
    }
    Ok(Json(payment))
}
