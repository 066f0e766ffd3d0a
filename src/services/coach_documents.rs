use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{FileUploadResponse, FileUploadResult, UploadedFile};
use crate::services::file_storage::FileStorageService;
use crate::services::orchestrator::FileValidationOrchestrator;

/// Validates a coach's verification documents and stores them when the whole batch passes.
pub struct CoachDocumentUploadService {
    orchestrator: Arc<FileValidationOrchestrator>,
    storage: Arc<FileStorageService>,
}

impl CoachDocumentUploadService {
    pub fn new(orchestrator: Arc<FileValidationOrchestrator>, storage: Arc<FileStorageService>) -> Self {
        Self { orchestrator, storage }
    }

    /// Validate the batch, then store every file in order.
    ///
    /// An invalid batch returns its validation outcomes and nothing is stored.
    /// Files whose names land on the same storage path fail the whole batch.
    /// Cancellation is checked before each write; files already written stay.
    pub async fn process_upload(
        &self,
        files: Vec<UploadedFile>,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> AppResult<FileUploadResponse> {
        if files.is_empty() {
            return Err(AppError::MissingFile);
        }

        info!(user_id = %user_id, file_count = files.len(), "Processing coach document upload");

        let batch = self.orchestrator.validate_files(&files)?;
        if !batch.is_valid {
            warn!(
                user_id = %user_id,
                rejected = batch.rejected_count(),
                batch_reasons = ?batch.batch_reasons,
                "Upload rejected, nothing stored"
            );
            return Ok(FileUploadResponse::from_validation(&batch));
        }

        let paths = self.storage.target_paths(user_id, &files)?;

        let mut results = Vec::with_capacity(files.len());
        for ((file, path), validation) in files.iter().zip(paths).zip(batch.results.iter()) {
            if cancel.is_cancelled() {
                warn!(user_id = %user_id, stored = results.len(), "Upload cancelled before storage completed");
                return Err(AppError::Cancelled);
            }

            let stored = self.storage.store_at(path, user_id, file).await?;
            results.push(FileUploadResult::from(validation).with_location(stored.location));
        }

        info!(user_id = %user_id, stored = results.len(), "Coach documents stored");

        Ok(FileUploadResponse {
            success: true,
            files: results,
            batch_reasons: Vec::new(),
        })
    }

    /// Validate a single replacement document and swap it in for `old_path`.
    pub async fn replace_document(
        &self,
        old_path: &str,
        file: UploadedFile,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> AppResult<FileUploadResponse> {
        self.storage.check_path(old_path)?;

        let files = vec![file];
        let batch = self.orchestrator.validate_files(&files)?;
        if !batch.is_valid {
            warn!(user_id = %user_id, old_path = %old_path, "Replacement rejected, nothing stored");
            return Ok(FileUploadResponse::from_validation(&batch));
        }

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let stored = self.storage.replace(old_path, user_id, &files[0]).await?;
        info!(user_id = %user_id, old_path = %old_path, new_path = %stored.path, "Coach document replaced");

        Ok(FileUploadResponse {
            success: true,
            files: batch
                .results
                .iter()
                .map(|r| FileUploadResult::from(r).with_location(stored.location.clone()))
                .collect(),
            batch_reasons: Vec::new(),
        })
    }
}
