use axum::{extract::State, http::{header, StatusCode}, response::IntoResponse, Json};
use crate::state::AppState;
use serde_json::json;
use std::sync::Arc;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics_handle {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "Metrics recorder not installed" }))).into_response(),
    }
}
