//! Dropbox HTTP API v2 backend authenticated with an OAuth bearer token.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};

use super::{BackendKind, StorageBackend, StorageError, StorageResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct DropboxStorage {
    client: Client,
    access_token: String,
    api_url: String,
    content_url: String,
}

#[derive(Debug, Deserialize)]
struct FileMetadata {
    path_display: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Debug, Deserialize)]
struct SharedLinkList {
    links: Vec<SharedLink>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error_summary: String,
}

impl DropboxStorage {
    pub fn new(
        access_token: impl Into<String>,
        api_url: impl Into<String>,
        content_url: impl Into<String>,
    ) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            access_token: access_token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            content_url: content_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Dropbox paths are absolute and never climb out of the app folder.
    fn dropbox_path(path: &str) -> StorageResult<String> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() || trimmed.split('/').any(|segment| segment == "..") {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(format!("/{}", trimmed))
    }

    /// Shared links open a preview page by default; `raw=1` serves the file itself.
    fn direct_link(url: &str) -> String {
        url.replace("dl=0", "raw=1")
    }

    async fn rpc(&self, endpoint: &str, body: serde_json::Value) -> StorageResult<Response> {
        self.client
            .post(format!("{}/2/{}", self.api_url, endpoint))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("Dropbox {} request failed: {}", endpoint, e)))
    }

    /// Read the `error_summary` of a failed call.
    async fn error_summary(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let summary = serde_json::from_str::<ApiError>(&text)
            .map(|e| e.error_summary)
            .unwrap_or(text);
        (status, summary)
    }

    async fn existing_link(&self, path: &str) -> StorageResult<String> {
        let response = self
            .rpc("sharing/list_shared_links", json!({ "path": path, "direct_only": true }))
            .await?;

        if !response.status().is_success() {
            let (status, summary) = Self::error_summary(response).await;
            return Err(StorageError::LinkFailed(format!("{}: {}", status, summary)));
        }

        let list: SharedLinkList = response
            .json()
            .await
            .map_err(|e| StorageError::LinkFailed(format!("Invalid list_shared_links response: {}", e)))?;

        list.links
            .into_iter()
            .next()
            .map(|link| Self::direct_link(&link.url))
            .ok_or_else(|| StorageError::LinkFailed(format!("No shared link found for {}", path)))
    }
}

/// JSON for the `Dropbox-API-Arg` header, which must be plain ASCII.
fn header_safe_json(value: &serde_json::Value) -> String {
    let mut out = String::new();
    for c in value.to_string().chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

#[async_trait]
impl StorageBackend for DropboxStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::Dropbox
    }

    fn validate_path(&self, path: &str) -> StorageResult<()> {
        Self::dropbox_path(path).map(|_| ())
    }

    async fn store(&self, path: &str, data: Bytes) -> StorageResult<String> {
        let target = Self::dropbox_path(path)?;
        let size = data.len();
        let start = Instant::now();
        let arg = json!({ "path": target, "mode": "overwrite", "autorename": false, "mute": true });

        let response = self
            .client
            .post(format!("{}/2/files/upload", self.content_url))
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", header_safe_json(&arg))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let (status, summary) = Self::error_summary(response).await;
            return Err(StorageError::UploadFailed(format!("{}: {}", status, summary)));
        }

        let metadata: FileMetadata = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Invalid upload response: {}", e)))?;

        tracing::info!(
            path = %target,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Dropbox upload successful"
        );

        Ok(metadata.path_display.unwrap_or(target))
    }

    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let target = Self::dropbox_path(path)?;
        let arg = json!({ "path": target });

        let response = self
            .client
            .post(format!("{}/2/files/download", self.content_url))
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", header_safe_json(&arg))
            .send()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let (status, summary) = Self::error_summary(response).await;
            if status == StatusCode::CONFLICT && summary.contains("not_found") {
                return Err(StorageError::NotFound(target));
            }
            return Err(StorageError::DownloadFailed(format!("{}: {}", status, summary)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
        Ok(body.to_vec())
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        let target = Self::dropbox_path(path)?;
        let response = self.rpc("files/delete_v2", json!({ "path": target })).await?;

        if response.status().is_success() {
            tracing::info!(path = %target, "Dropbox delete successful");
            return Ok(true);
        }

        let (status, summary) = Self::error_summary(response).await;
        if status == StatusCode::CONFLICT && summary.contains("not_found") {
            tracing::debug!(path = %target, "Dropbox delete found nothing to remove");
            return Ok(false);
        }
        Err(StorageError::DeleteFailed(format!("{}: {}", status, summary)))
    }

    async fn shared_link(&self, path: &str) -> StorageResult<String> {
        let target = Self::dropbox_path(path)?;
        let response = self
            .rpc(
                "sharing/create_shared_link_with_settings",
                json!({ "path": target, "settings": { "requested_visibility": "public" } }),
            )
            .await?;

        if response.status().is_success() {
            let link: SharedLink = response
                .json()
                .await
                .map_err(|e| StorageError::LinkFailed(format!("Invalid shared link response: {}", e)))?;
            return Ok(Self::direct_link(&link.url));
        }

        let (status, summary) = Self::error_summary(response).await;
        if summary.contains("shared_link_already_exists") {
            return self.existing_link(&target).await;
        }
        if status == StatusCode::CONFLICT && summary.contains("not_found") {
            return Err(StorageError::NotFound(target));
        }
        Err(StorageError::LinkFailed(format!("{}: {}", status, summary)))
    }
}
