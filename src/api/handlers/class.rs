use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::CreateClassRequest;
use crate::api::extractors::auth::{AdminUser, AuthUser};
use crate::domain::models::class::NewClassParams;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub async fn list_classes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.list_classes().await?))
}

pub async fn get_class(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.get_class(&class_id).await?))
}

pub async fn create_class(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<CreateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.catalog.create_class(NewClassParams {
        title: payload.title,
        description: payload.description,
        trainer_id: payload.trainer_id,
        start_time: payload.start_time,
        duration_min: payload.duration_min,
        capacity: payload.capacity,
    }).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn class_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.class_bookings(&class_id).await?))
}

pub async fn book_class(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let reservation = state.reservations.reserve(&user.user_id, &class_id).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}
