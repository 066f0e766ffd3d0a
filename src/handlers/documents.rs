use axum::{
    extract::{Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::files::require_path;
use crate::error::{AppError, AppResult};
use crate::middleware::request_id;
use crate::models::{FileUploadResponse, StoredPathQuery, UploadedFile, ValidationReport};
use crate::state::AppState;

const FILE_FIELDS: [&str; 2] = ["files", "file"];
const USER_ID_FIELD: &str = "user_id";

/// Parts of an upload form we care about.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub user_id: Option<Uuid>,
}

impl UploadForm {
    fn require_user_id(&self) -> AppResult<Uuid> {
        self.user_id
            .ok_or_else(|| AppError::validation("Missing user_id field"))
    }
}

/// Cancels its token once the request deadline passes.
struct Deadline {
    token: CancellationToken,
    timer: JoinHandle<()>,
}

impl Deadline {
    fn start(timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let timer_token = token.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            timer_token.cancel();
        });
        Self { token, timer }
    }

    fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

fn response_status(response: &FileUploadResponse) -> StatusCode {
    if response.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

/// Upload a batch of coach verification documents.
pub async fn upload_documents_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<FileUploadResponse>)> {
    let start = Instant::now();
    let request_id = request_id(&headers);
    let deadline = Deadline::start(state.request_timeout());

    info!(request_id = %request_id, "Starting coach document upload");

    let form = tokio::time::timeout(state.request_timeout(), read_upload_form(&mut multipart)).await??;
    let user_id = form.require_user_id()?;

    let response = match state
        .uploads
        .process_upload(form.files, user_id, deadline.token())
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Coach document upload failed");
            return Err(e);
        }
    };

    info!(
        request_id = %request_id,
        user_id = %user_id,
        success = response.success,
        stored = response.stored_locations().len(),
        total_time_ms = start.elapsed().as_millis(),
        "Coach document upload completed"
    );

    Ok((response_status(&response), Json(response)))
}

/// Replace a stored document with a newly uploaded one.
pub async fn replace_document_handler(
    State(state): State<AppState>,
    Query(query): Query<StoredPathQuery>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<FileUploadResponse>)> {
    let request_id = request_id(&headers);
    let old_path = require_path(&query)?;
    let deadline = Deadline::start(state.request_timeout());

    info!(request_id = %request_id, old_path = %old_path, "Starting coach document replacement");

    let form = tokio::time::timeout(state.request_timeout(), read_upload_form(&mut multipart)).await??;
    let user_id = form.require_user_id()?;

    let mut files = form.files;
    let file = match files.len() {
        0 => return Err(AppError::MissingFile),
        1 => files.remove(0),
        n => {
            warn!(request_id = %request_id, file_count = n, "Replacement needs exactly one file");
            return Err(AppError::validation("Exactly one replacement file is required"));
        }
    };

    let response = state
        .uploads
        .replace_document(old_path, file, user_id, deadline.token())
        .await?;

    info!(request_id = %request_id, success = response.success, "Coach document replacement completed");

    Ok((response_status(&response), Json(response)))
}

/// Validate a batch without storing anything.
pub async fn validate_files_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ValidationReport>)> {
    let form = tokio::time::timeout(state.request_timeout(), read_upload_form(&mut multipart)).await??;
    if form.files.is_empty() {
        return Err(AppError::MissingFile);
    }

    let same_type = state.orchestrator.are_all_files_same_type(&form.files)?;
    let batch = state.orchestrator.validate_files(&form.files)?;
    let response = FileUploadResponse::from_validation(&batch);

    debug!(
        file_count = form.files.len(),
        same_type,
        valid = batch.is_valid,
        "Dry-run validation completed"
    );

    Ok((response_status(&response), Json(ValidationReport { same_type, response })))
}

/// Read every file part and the uploader id from a multipart form.
pub async fn read_upload_form(multipart: &mut Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_file(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if FILE_FIELDS.contains(&name.as_str()) {
            let file_name = field.file_name().unwrap_or("unknown").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::invalid_file(format!("Failed to read file data: {}", e)))?;

            debug!(file_name = %file_name, content_type = %content_type, size = data.len(), "Read file part");
            form.files.push(UploadedFile::new(file_name, content_type, data));
        } else if name == USER_ID_FIELD {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::validation(format!("Failed to read user_id: {}", e)))?;
            let user_id = Uuid::parse_str(text.trim())
                .map_err(|_| AppError::validation("user_id must be a valid UUID"))?;
            form.user_id = Some(user_id);
        } else {
            debug!("Ignoring multipart field {}", name);
        }
    }

    Ok(form)
}
