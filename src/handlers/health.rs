use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use crate::error::AppResult;
use crate::models::FileCategory;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    info!("Health check requested");

    let categories = state.orchestrator.factory().categories();
    let validators_ready = FileCategory::ALL.iter().all(|c| categories.contains(c));
    let validators: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
    let metrics = state.limiter.metrics();

    let status = if validators_ready { "healthy" } else { "degraded" };

    let response = json!({
        "status": status,
        "timestamp": Utc::now().timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "storage_backend": state.storage.backend_kind().to_string(),
            "validators": validators,
        },
        "limits": {
            "max_file_size_bytes": state.config.max_file_size_bytes,
            "max_total_size_bytes": state.config.max_total_size_bytes,
            "request_timeout_seconds": state.config.request_timeout_seconds,
        },
        "rate_limiting": {
            "total_requests": metrics.total_requests,
            "rejected_requests": metrics.rejected_requests,
            "available_permits": metrics.available_permits,
            "max_requests": metrics.max_requests,
        }
    });

    info!(status = status, "Health check completed");

    Ok(Json(response))
}

/// Readiness check endpoint
pub async fn ready_handler(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    let categories = state.orchestrator.factory().categories();

    if FileCategory::ALL.iter().all(|c| categories.contains(c)) {
        info!("Readiness check passed");
        Ok(StatusCode::OK)
    } else {
        info!("Readiness check failed - validator registry incomplete");
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
