use axum::{extract::{Request, State}, middleware::Next, response::Response};
use crate::error::AppError;
use crate::metrics;
use crate::state::AppState;
use std::sync::Arc;
use tracing::warn;

/// Rejects the request with 429 once the shared budget is spent.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            warn!(path = %request.uri().path(), "Request rejected by rate limiter");
            metrics::record_rate_limited();
            return Err(AppError::RateLimited);
        }
    }
    Ok(next.run(request).await)
}
