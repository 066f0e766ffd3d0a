pub mod documents;
pub mod files;
pub mod health;

pub use documents::*;
pub use files::*;
pub use health::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{auth_middleware, logging_middleware, rate_limit_middleware};
use crate::state::AppState;

/// Build the application router with auth, rate limiting and request logging.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes();

    Router::new()
        // Health endpoints (no auth required)
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        // API endpoints (auth required)
        .route(
            "/api/v1/coach-documents",
            post(upload_documents_handler).put(replace_document_handler),
        )
        .route("/api/v1/files/validate", post(validate_files_handler))
        .route("/api/v1/files/link", get(shared_link_handler))
        .route("/api/v1/files", delete(delete_file_handler))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(logging_middleware))
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware))
                .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware)),
        )
        .with_state(state)
}
