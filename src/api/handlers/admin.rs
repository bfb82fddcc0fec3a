use axum::{extract::{Query, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::{FlushCacheRequest, StatusQuery};
use crate::api::dtos::responses::StatsResponse;
use crate::api::extractors::auth::AdminUser;
use crate::error::AppError;
use crate::state::AppState;
use serde_json::json;
use std::sync::Arc;

pub async fn stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> impl IntoResponse {
    Json(StatsResponse {
        cache: state.cache.stats().await,
        notifications: state.dispatcher.stats(),
    })
}

pub async fn all_payments(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.all_payments(query.status.as_deref()).await?))
}

pub async fn all_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.all_bookings(query.status.as_deref()).await?))
}

pub async fn flush_cache(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<FlushCacheRequest>,
) -> Result<impl IntoResponse, AppError> {
    let removed = state.catalog.flush_cache(&payload.prefix).await?;
    Ok(Json(json!({ "prefix": payload.prefix, "removed": removed })))
}
