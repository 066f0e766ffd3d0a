use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::FileCategory;
use super::request::UploadedFile;

/// Why a file (or a whole batch) was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    SizeExceeded,
    ExtensionNotAllowed,
    MimeTypeNotAllowed,
    ContentSignatureMismatch,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::SizeExceeded => "SizeExceeded",
            RejectionReason::ExtensionNotAllowed => "ExtensionNotAllowed",
            RejectionReason::MimeTypeNotAllowed => "MimeTypeNotAllowed",
            RejectionReason::ContentSignatureMismatch => "ContentSignatureMismatch",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Accepted,
    Rejected,
}

/// Outcome of validating a single file. Read-only once built.
#[derive(Debug, Clone, Serialize)]
pub struct FileValidationResult {
    file_name: String,
    content_type: String,
    size: usize,
    category: FileCategory,
    outcome: ValidationOutcome,
    reasons: Vec<RejectionReason>,
}

impl FileValidationResult {
    /// Build a result; the outcome follows from whether any reason was collected.
    pub fn new(file: &UploadedFile, category: FileCategory, reasons: Vec<RejectionReason>) -> Self {
        let outcome = if reasons.is_empty() {
            ValidationOutcome::Accepted
        } else {
            ValidationOutcome::Rejected
        };

        Self {
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
            size: file.size,
            category,
            outcome,
            reasons,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn category(&self) -> FileCategory {
        self.category
    }

    pub fn outcome(&self) -> ValidationOutcome {
        self.outcome
    }

    pub fn reasons(&self) -> &[RejectionReason] {
        &self.reasons
    }

    pub fn is_accepted(&self) -> bool {
        self.outcome == ValidationOutcome::Accepted
    }
}

/// Aggregate of a batch validation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchValidationResult {
    pub is_valid: bool,
    pub total_size: u64,
    /// Per-file results in input order; empty when the batch was rejected as a whole.
    pub results: Vec<FileValidationResult>,
    pub batch_reasons: Vec<RejectionReason>,
}

impl BatchValidationResult {
    pub fn from_results(results: Vec<FileValidationResult>, total_size: u64) -> Self {
        let is_valid = results.iter().all(FileValidationResult::is_accepted);
        Self {
            is_valid,
            total_size,
            results,
            batch_reasons: Vec::new(),
        }
    }

    pub fn rejected_batch(reason: RejectionReason, total_size: u64) -> Self {
        Self {
            is_valid: false,
            total_size,
            results: Vec::new(),
            batch_reasons: vec![reason],
        }
    }

    pub fn rejected_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_accepted()).count()
    }
}
