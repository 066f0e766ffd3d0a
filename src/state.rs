use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::AppResult;
use crate::middleware::rate_limit::RequestLimiter;
use crate::services::{CoachDocumentUploadService, FileStorageService, FileValidationOrchestrator};

/// Shared, read-only application services handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<FileValidationOrchestrator>,
    pub storage: Arc<FileStorageService>,
    pub uploads: Arc<CoachDocumentUploadService>,
    pub limiter: Arc<RequestLimiter>,
}

impl AppState {
    pub async fn from_config(config: Config) -> AppResult<Self> {
        let storage = FileStorageService::from_config(&config).await?;
        Ok(Self::new(config, storage))
    }

    /// Wire the services around an already built storage service.
    pub fn new(config: Config, storage: FileStorageService) -> Self {
        let orchestrator = Arc::new(FileValidationOrchestrator::from_config(&config));
        let storage = Arc::new(storage);
        let uploads = Arc::new(CoachDocumentUploadService::new(orchestrator.clone(), storage.clone()));
        let limiter = Arc::new(RequestLimiter::new(config.max_concurrent_requests));

        Self {
            config: Arc::new(config),
            orchestrator,
            storage,
            uploads,
            limiter,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_seconds)
    }
}
