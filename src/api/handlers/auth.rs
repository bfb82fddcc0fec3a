use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{LoginRequest, RegisterRequest};
use crate::api::dtos::responses::{LoginResponse, UserProfile};
use crate::api::extractors::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.register(&payload.name, &payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (session, user) = state.auth_service.login(&payload.email, &payload.password).await?;
    Ok(Json(LoginResponse::new(session, &user)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> impl IntoResponse {
    state.auth_service.logout(&user.session_id).await;
    info!(user_id = %user.user_id, "User logged out");
    StatusCode::NO_CONTENT
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.catalog.get_user(&user.user_id).await?;
    Ok(Json(UserProfile::from(&profile)))
}
