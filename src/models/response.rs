use serde::{Deserialize, Serialize};

use super::validation::{BatchValidationResult, FileValidationResult, RejectionReason};

/// Response of an upload, replace or dry-run validation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    pub success: bool,
    pub files: Vec<FileUploadResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub batch_reasons: Vec<RejectionReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResult {
    pub filename: String,
    pub accepted: bool,
    pub reasons: Vec<RejectionReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_location: Option<String>,
}

/// Dry-run validation report.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub same_type: bool,
    #[serde(flatten)]
    pub response: FileUploadResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedLinkResponse {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

impl FileUploadResponse {
    /// Response carrying validation outcomes only, nothing stored.
    pub fn from_validation(batch: &BatchValidationResult) -> Self {
        Self {
            success: batch.is_valid,
            files: batch.results.iter().map(FileUploadResult::from).collect(),
            batch_reasons: batch.batch_reasons.clone(),
        }
    }

    pub fn stored_locations(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter_map(|f| f.stored_location.as_deref())
            .collect()
    }
}

impl From<&FileValidationResult> for FileUploadResult {
    fn from(result: &FileValidationResult) -> Self {
        Self {
            filename: result.file_name().to_string(),
            accepted: result.is_accepted(),
            reasons: result.reasons().to_vec(),
            stored_location: None,
        }
    }
}

impl FileUploadResult {
    pub fn with_location(mut self, location: String) -> Self {
        self.stored_location = Some(location);
        self
    }
}
