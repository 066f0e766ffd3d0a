use tracing::debug;

use crate::config::{CategoryOptions, FileTypeOptions};
use crate::models::{FileCategory, FileValidationResult, RejectionReason, UploadedFile};
use crate::services::inspector::{FileContentInspector, ImageContentInspector, PdfContentInspector};

/// Validation contract shared by every file category.
pub trait FileValidator: Send + Sync {
    fn category(&self) -> FileCategory;

    /// Run every check and collect all failures; never stops at the first one.
    fn validate(&self, file: &UploadedFile) -> FileValidationResult;
}

/// Size limit and allow-lists applied to one category.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub max_file_size: u64,
    pub allowed: CategoryOptions,
}

impl ValidationRules {
    pub fn new(max_file_size: u64, allowed: CategoryOptions) -> Self {
        Self { max_file_size, allowed }
    }

    /// Size, extension, MIME type, then signature. Each failure adds its own reason.
    pub fn check(&self, file: &UploadedFile, inspector: &dyn FileContentInspector) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();

        if file.size as u64 > self.max_file_size {
            reasons.push(RejectionReason::SizeExceeded);
        }

        if !self.allowed.allows_extension(&file.extension()) {
            reasons.push(RejectionReason::ExtensionNotAllowed);
        }

        if !self.allowed.allows_mime_type(&file.mime_type()) {
            reasons.push(RejectionReason::MimeTypeNotAllowed);
        }

        if !inspector.is_valid_content(&mut file.reader(), &file.content_type) {
            reasons.push(RejectionReason::ContentSignatureMismatch);
        }

        if !reasons.is_empty() {
            debug!(
                file_name = %file.name,
                category = %inspector.category(),
                reasons = ?reasons,
                "File failed validation"
            );
        }

        reasons
    }
}

pub struct ImageFileValidator {
    rules: ValidationRules,
    inspector: ImageContentInspector,
}

impl ImageFileValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self {
            rules,
            inspector: ImageContentInspector::new(),
        }
    }

    pub fn from_options(options: &FileTypeOptions, max_file_size: u64) -> Self {
        Self::new(ValidationRules::new(max_file_size, options.image.clone()))
    }
}

impl FileValidator for ImageFileValidator {
    fn category(&self) -> FileCategory {
        FileCategory::Image
    }

    fn validate(&self, file: &UploadedFile) -> FileValidationResult {
        let reasons = self.rules.check(file, &self.inspector);
        FileValidationResult::new(file, FileCategory::Image, reasons)
    }
}

pub struct PdfFileValidator {
    rules: ValidationRules,
    inspector: PdfContentInspector,
}

impl PdfFileValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self {
            rules,
            inspector: PdfContentInspector::new(),
        }
    }

    pub fn from_options(options: &FileTypeOptions, max_file_size: u64) -> Self {
        Self::new(ValidationRules::new(max_file_size, options.pdf.clone()))
    }
}

impl FileValidator for PdfFileValidator {
    fn category(&self) -> FileCategory {
        FileCategory::Pdf
    }

    fn validate(&self, file: &UploadedFile) -> FileValidationResult {
        let reasons = self.rules.check(file, &self.inspector);
        FileValidationResult::new(file, FileCategory::Pdf, reasons)
    }
}
