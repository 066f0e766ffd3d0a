use bytes::Bytes;
use serde::Deserialize;
use std::io::Cursor;

use super::category::{normalize_extension, normalize_mime_type, FileCategory};

/// Query string for operations addressing an already stored file.
#[derive(Debug, Deserialize)]
pub struct StoredPathQuery {
    pub path: String,
}

/// A file received in an upload request. Lives only for the request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub size: usize,
    pub content: Bytes,
    pub content_type: String,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len(),
            content,
            content_type: content_type.into(),
        }
    }

    pub fn extension(&self) -> String {
        normalize_extension(&self.name)
    }

    pub fn mime_type(&self) -> String {
        normalize_mime_type(&self.content_type)
    }

    pub fn declared_category(&self) -> Option<FileCategory> {
        FileCategory::resolve(&self.content_type, &self.name)
    }

    /// Seekable view over the content for signature inspection.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.content.as_ref())
    }
}
