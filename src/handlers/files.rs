use axum::{
    extract::{Query, State},
    response::Json,
};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{DeleteResponse, SharedLinkResponse, StoredPathQuery};
use crate::state::AppState;

pub(crate) fn require_path(query: &StoredPathQuery) -> AppResult<&str> {
    let path = query.path.trim();
    if path.is_empty() {
        return Err(AppError::validation("Query parameter 'path' must not be empty"));
    }
    Ok(path)
}

pub async fn shared_link_handler(
    State(state): State<AppState>,
    Query(query): Query<StoredPathQuery>,
) -> AppResult<Json<SharedLinkResponse>> {
    let path = require_path(&query)?;
    let url = state.storage.shared_link(path).await?;

    info!(path = %path, "Shared link issued");
    Ok(Json(SharedLinkResponse { url }))
}

pub async fn delete_file_handler(
    State(state): State<AppState>,
    Query(query): Query<StoredPathQuery>,
) -> AppResult<Json<DeleteResponse>> {
    let path = require_path(&query)?;
    let deleted = state.storage.delete(path).await?;

    info!(path = %path, deleted, "Delete requested");
    Ok(Json(DeleteResponse { deleted }))
}
