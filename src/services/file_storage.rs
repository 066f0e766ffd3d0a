use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{Config, StorageBackendKind};
use crate::error::{AppError, AppResult};
use crate::models::UploadedFile;
use crate::storage::{BackendKind, DropboxStorage, LocalFileStorage, StorageBackend};

const MAX_FILENAME_LENGTH: usize = 255;

/// Where a stored file lives: the backend path and its addressable location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub path: String,
    pub location: String,
}

/// Persists accepted files under `{base_path}/{user_id}/{file name}`.
pub struct FileStorageService {
    backend: Arc<dyn StorageBackend>,
    base_path: String,
}

impl FileStorageService {
    pub fn new(backend: Arc<dyn StorageBackend>, base_path: impl Into<String>) -> Self {
        Self {
            backend,
            base_path: base_path.into().trim_matches('/').to_string(),
        }
    }

    /// Build the backend selected by configuration.
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let storage = &config.storage;
        let backend: Arc<dyn StorageBackend> = match storage.backend {
            StorageBackendKind::Local => Arc::new(
                LocalFileStorage::new(storage.local_root.clone(), storage.public_base_url.clone()).await?,
            ),
            StorageBackendKind::Dropbox => {
                let token = storage
                    .dropbox_access_token
                    .clone()
                    .ok_or_else(|| AppError::config("DROPBOX_ACCESS_TOKEN is not set"))?;
                Arc::new(DropboxStorage::new(
                    token,
                    storage.dropbox_api_url.clone(),
                    storage.dropbox_content_url.clone(),
                )?)
            }
        };

        info!(backend = %backend.kind(), base_path = %storage.base_path, "Storage backend ready");
        Ok(Self::new(backend, storage.base_path.clone()))
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Deterministic target path, so storing the same file twice overwrites it.
    pub fn target_path(&self, user_id: Uuid, file_name: &str) -> AppResult<String> {
        let name = sanitize_filename(file_name)?;
        if self.base_path.is_empty() {
            Ok(format!("{}/{}", user_id, name))
        } else {
            Ok(format!("{}/{}/{}", self.base_path, user_id, name))
        }
    }

    /// Target path of every file in the batch.
    ///
    /// Two files that sanitize to the same path would overwrite each other, so the
    /// batch is refused instead.
    pub fn target_paths(&self, user_id: Uuid, files: &[UploadedFile]) -> AppResult<Vec<String>> {
        let mut seen = HashSet::with_capacity(files.len());
        files
            .iter()
            .map(|file| {
                let path = self.target_path(user_id, &file.name)?;
                if !seen.insert(path.clone()) {
                    warn!(user_id = %user_id, path = %path, "Duplicate file name in upload batch");
                    return Err(AppError::validation(format!(
                        "Duplicate file name '{}' in upload batch",
                        file.name
                    )));
                }
                Ok(path)
            })
            .collect()
    }

    /// Fail unless the backend would accept `path`. Nothing is read or written.
    pub fn check_path(&self, path: &str) -> AppResult<()> {
        if path.trim().is_empty() {
            return Err(AppError::validation("Missing path of the stored file"));
        }
        Ok(self.backend.validate_path(path)?)
    }

    pub async fn store(&self, user_id: Uuid, file: &UploadedFile) -> AppResult<StoredFile> {
        let path = self.target_path(user_id, &file.name)?;
        self.store_at(path, user_id, file).await
    }

    /// Write `file` at a path already computed by [`Self::target_path`].
    pub async fn store_at(&self, path: String, user_id: Uuid, file: &UploadedFile) -> AppResult<StoredFile> {
        let location = self.backend.store(&path, file.content.clone()).await.map_err(|e| {
            warn!(path = %path, error = %e, "Storing file failed");
            AppError::from(e)
        })?;

        info!(user_id = %user_id, path = %path, size = file.size, "File stored");
        Ok(StoredFile { path, location })
    }

    /// Store `file` and drop the previous file at `old_path` if it lived elsewhere.
    ///
    /// `old_path` is checked before anything is written.
    pub async fn replace(&self, old_path: &str, user_id: Uuid, file: &UploadedFile) -> AppResult<StoredFile> {
        self.check_path(old_path)?;
        let stored = self.store(user_id, file).await?;

        if stored.path != old_path.trim_matches('/') {
            let removed = self.backend.delete(old_path).await?;
            if !removed {
                warn!(old_path = %old_path, "Replaced file did not exist");
            }
        }

        Ok(stored)
    }

    pub async fn delete(&self, path: &str) -> AppResult<bool> {
        Ok(self.backend.delete(path).await?)
    }

    pub async fn shared_link(&self, path: &str) -> AppResult<String> {
        Ok(self.backend.shared_link(path).await?)
    }

    pub async fn read(&self, path: &str) -> AppResult<Vec<u8>> {
        Ok(self.backend.read(path).await?)
    }
}

/// Keep only the final path component and replace anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(file_name: &str) -> AppResult<String> {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);

    let sanitized: String = name
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Names made only of dots (".", "..") or replaced characters are refused.
    if sanitized.trim_matches(|c: char| c == '.' || c == '_').is_empty() {
        return Err(AppError::invalid_file(format!("Unusable file name '{}'", file_name)));
    }

    Ok(sanitized)
}
