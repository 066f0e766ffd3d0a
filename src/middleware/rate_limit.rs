use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::state::AppState;

/// Caps the number of uploads processed at once.
pub struct RequestLimiter {
    semaphore: Semaphore,
    max_requests: usize,
    total_requests: AtomicU64,
    rejected_requests: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateLimitMetrics {
    pub total_requests: u64,
    pub rejected_requests: u64,
    pub available_permits: usize,
    pub max_requests: usize,
}

impl RequestLimiter {
    pub fn new(max_requests: usize) -> Self {
        info!(max_concurrent_requests = max_requests, "Initializing request limiter");
        Self {
            semaphore: Semaphore::new(max_requests),
            max_requests,
            total_requests: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
        }
    }

    /// Take a permit without waiting; the permit is released on drop.
    pub fn try_acquire(&self) -> Result<SemaphorePermit<'_>, AppError> {
        let total = self.total_requests.fetch_add(1, Ordering::Relaxed) + 1;

        self.semaphore.try_acquire().map_err(|_| {
            let rejected = self.rejected_requests.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                total_requests = total,
                rejected_requests = rejected,
                "Rate limit exceeded - too many concurrent requests"
            );
            AppError::RateLimitExceeded
        })
    }

    pub fn metrics(&self) -> RateLimitMetrics {
        RateLimitMetrics {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            available_permits: self.semaphore.available_permits(),
            max_requests: self.max_requests,
        }
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    if path == "/health" || path == "/ready" {
        return Ok(next.run(request).await);
    }

    let limiter = state.limiter.clone();
    let _permit = limiter.try_acquire()?;

    debug!(
        path = %path,
        available_permits = limiter.metrics().available_permits,
        "Request permit acquired"
    );

    Ok(next.run(request).await)
}
