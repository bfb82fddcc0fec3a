use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::CreateTrainerRequest;
use crate::api::extractors::auth::AdminUser;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub async fn list_trainers(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.list_trainers().await?))
}

pub async fn get_trainer(
    State(state): State<Arc<AppState>>,
    Path(trainer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.get_trainer(&trainer_id).await?))
}

pub async fn create_trainer(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<CreateTrainerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let trainer = state.catalog.create_trainer(payload.name, payload.bio).await?;
    Ok((StatusCode::CREATED, Json(trainer)))
}
