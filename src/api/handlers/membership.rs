use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{CreatePlanRequest, PurchaseRequest};
use crate::api::extractors::auth::{AdminUser, AuthUser};
use crate::error::AppError;
use crate::state::AppState;
use serde_json::json;
use std::sync::Arc;

pub async fn list_plans(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.list_plans().await?))
}

pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plan = state.catalog.create_plan(payload.name, payload.duration_days, payload.price_cents).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.get_plan(&plan_id).await?))
}

pub async fn purchase(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(plan_id): Path<String>,
    Json(payload): Json<PurchaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = state.ledger.purchase(&user.user_id, &plan_id, &payload.payment_method).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn my_membership(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let current = state.catalog.current_membership(&user.user_id).await?;
    let history = state.ledger.list_grants(&user.user_id).await?;
    Ok(Json(json!({
        "active": current.is_some(),
        "membership": current,
        "history": history,
    })))
}
