use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{BatchValidationResult, FileValidationResult, RejectionReason, UploadedFile};
use crate::services::factory::FileValidatorFactory;

/// Validates single files and batches against the registered validators.
pub struct FileValidationOrchestrator {
    factory: Arc<FileValidatorFactory>,
    max_total_size: u64,
}

impl FileValidationOrchestrator {
    pub fn new(factory: Arc<FileValidatorFactory>, max_total_size: u64) -> Self {
        Self {
            factory,
            max_total_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let factory = FileValidatorFactory::new(&config.file_types, config.max_file_size_bytes);
        Self::new(Arc::new(factory), config.max_total_size_bytes)
    }

    pub fn factory(&self) -> &FileValidatorFactory {
        &self.factory
    }

    pub fn validate_file(&self, file: &UploadedFile) -> AppResult<FileValidationResult> {
        let validator = self.factory.get_validator(file)?;
        Ok(validator.validate(file))
    }

    /// Validate every file of a batch.
    ///
    /// A batch over the total-size cap is rejected without inspecting its files.
    /// Otherwise results come back in input order.
    pub fn validate_files(&self, files: &[UploadedFile]) -> AppResult<BatchValidationResult> {
        let total_size: u64 = files.iter().map(|f| f.size as u64).sum();

        if total_size > self.max_total_size {
            warn!(
                file_count = files.len(),
                total_size = total_size,
                max_total_size = self.max_total_size,
                "Batch exceeds total size limit"
            );
            return Ok(BatchValidationResult::rejected_batch(RejectionReason::SizeExceeded, total_size));
        }

        let results = files
            .iter()
            .map(|file| self.validate_file(file))
            .collect::<AppResult<Vec<_>>>()?;

        let batch = BatchValidationResult::from_results(results, total_size);

        if batch.is_valid {
            info!(file_count = files.len(), total_size = total_size, "Batch passed validation");
        } else {
            info!(
                file_count = files.len(),
                rejected = batch.rejected_count(),
                "Batch failed validation"
            );
        }

        Ok(batch)
    }

    /// True when every file resolves to the same category. An empty batch is homogeneous.
    pub fn are_all_files_same_type(&self, files: &[UploadedFile]) -> AppResult<bool> {
        let mut first = None;
        for file in files {
            let category = self.factory.resolve_category(file)?;
            match first {
                None => first = Some(category),
                Some(expected) if expected != category => {
                    debug!(expected = %expected, found = %category, file_name = %file.name, "Mixed batch");
                    return Ok(false);
                }
                Some(_) => {}
            }
        }
        Ok(true)
    }
}
