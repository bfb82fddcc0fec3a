use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::api::dtos::responses::CancelResponse;
use crate::api::extractors::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.user_bookings(&user.user_id).await?))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(reservation_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.reservations.cancel(&reservation_id, &user.user_id).await?;
    Ok(Json(CancelResponse::from(outcome)))
}
