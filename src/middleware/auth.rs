use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn, info};

use crate::error::AppError;
use crate::state::AppState;

/// Routes reachable without an API key.
const PUBLIC_PATHS: [&str; 2] = ["/health", "/ready"];

pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path();
    let method = request.method();

    if PUBLIC_PATHS.contains(&path) {
        debug!("Skipping auth for {}", path);
        return Ok(next.run(request).await);
    }

    debug!("Authenticating request: {} {}", method, path);

    let auth_header = match headers.get("authorization") {
        Some(header) => match header.to_str() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid Authorization header format for {} {}", method, path);
                return Err(AppError::InvalidApiKey);
            }
        },
        None => {
            warn!("Missing Authorization header for {} {}", method, path);
            return Err(AppError::InvalidApiKey);
        }
    };

    let token = match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => token,
        Some(_) => {
            warn!("Empty Bearer token for {} {}", method, path);
            return Err(AppError::InvalidApiKey);
        }
        None => {
            warn!("Authorization header missing Bearer prefix for {} {}", method, path);
            return Err(AppError::InvalidApiKey);
        }
    };

    if !state.config.validate_api_key(token) {
        warn!(
            "Invalid API key attempted for {} {}: {}",
            method,
            path,
            token.get(..8).unwrap_or(token)
        );
        return Err(AppError::InvalidApiKey);
    }

    info!("Valid API key authenticated for {} {}", method, path);
    Ok(next.run(request).await)
}
