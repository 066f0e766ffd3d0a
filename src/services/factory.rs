use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::config::FileTypeOptions;
use crate::error::{AppError, AppResult};
use crate::models::{FileCategory, UploadedFile};
use crate::services::validator::{FileValidator, ImageFileValidator, PdfFileValidator};

/// Registry of validators keyed by file category.
#[derive(Clone, Default)]
pub struct FileValidatorFactory {
    validators: HashMap<FileCategory, Arc<dyn FileValidator>>,
}

impl FileValidatorFactory {
    /// Factory with the image and PDF validators built from `options`.
    pub fn new(options: &FileTypeOptions, max_file_size: u64) -> Self {
        Self::empty()
            .with_validator(Arc::new(ImageFileValidator::from_options(options, max_file_size)))
            .with_validator(Arc::new(PdfFileValidator::from_options(options, max_file_size)))
    }

    pub fn empty() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    /// Register `validator` for its category, replacing any previous one.
    pub fn with_validator(mut self, validator: Arc<dyn FileValidator>) -> Self {
        self.validators.insert(validator.category(), validator);
        self
    }

    pub fn categories(&self) -> Vec<FileCategory> {
        FileCategory::ALL
            .into_iter()
            .filter(|c| self.validators.contains_key(c))
            .collect()
    }

    pub fn resolve_category(&self, file: &UploadedFile) -> AppResult<FileCategory> {
        file.declared_category().ok_or_else(|| {
            warn!(file_name = %file.name, content_type = %file.content_type, "No category for declared type");
            AppError::unsupported(&file.name, &file.content_type)
        })
    }

    pub fn lookup(&self, category: FileCategory) -> Option<Arc<dyn FileValidator>> {
        self.validators.get(&category).cloned()
    }

    /// Validator for the file's declared type, or `UnsupportedFileType`.
    pub fn get_validator(&self, file: &UploadedFile) -> AppResult<Arc<dyn FileValidator>> {
        let category = self.resolve_category(file)?;
        self.lookup(category).ok_or_else(|| {
            warn!(category = %category, "No validator registered for category");
            AppError::unsupported(&file.name, &file.content_type)
        })
    }
}
