//! Storage backends for accepted files.
//!
//! Backends are addressed by slash-separated relative paths. Storing to an
//! existing path overwrites it.

pub mod dropbox;
pub mod local;

pub use dropbox::DropboxStorage;
pub use local::LocalFileStorage;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Shared link failed: {0}")]
    LinkFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    Dropbox,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Dropbox => f.write_str("dropbox"),
        }
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Refuse a path this backend would not accept, without touching storage.
    fn validate_path(&self, path: &str) -> StorageResult<()> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() || trimmed.split('/').any(|segment| segment == ".." || segment == ".") {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(())
    }

    /// Write `data` at `path`, replacing any previous content. Returns the file's location.
    async fn store(&self, path: &str, data: Bytes) -> StorageResult<String>;

    async fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, path: &str) -> StorageResult<bool>;

    async fn shared_link(&self, path: &str) -> StorageResult<String>;
}
