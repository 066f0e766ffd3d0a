use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{BackendKind, StorageBackend, StorageError, StorageResult};

/// Files under a root directory, served from `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub async fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::Config(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self {
            root,
            public_base_url: public_base_url.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage path onto the filesystem, refusing anything that could leave the root.
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        if path.is_empty() || path.starts_with('/') || path.contains('\\') {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        let relative = Path::new(path);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        Ok(self.root.join(relative))
    }

    fn location(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl StorageBackend for LocalFileStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn validate_path(&self, path: &str) -> StorageResult<()> {
        self.resolve(path).map(|_| ())
    }

    async fn store(&self, path: &str, data: Bytes) -> StorageResult<String> {
        let target = self.resolve(path)?;
        let start = Instant::now();

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&target).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", target.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", target.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", target.display(), e))
        })?;

        tracing::info!(
            path = %target.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(self.location(path))
    }

    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let target = self.resolve(path)?;

        if !fs::try_exists(&target).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        fs::read(&target).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", target.display(), e))
        })
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        let target = self.resolve(path)?;

        if !fs::try_exists(&target).await.unwrap_or(false) {
            return Ok(false);
        }

        fs::remove_file(&target).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", target.display(), e))
        })?;

        tracing::info!(path = %target.display(), "Local storage delete successful");
        Ok(true)
    }

    async fn shared_link(&self, path: &str) -> StorageResult<String> {
        let target = self.resolve(path)?;

        if !fs::try_exists(&target).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        Ok(self.location(path))
    }
}
