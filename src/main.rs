use std::env;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attest::handlers::create_router;
use attest::{AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let json_logs = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attest=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_target(false)))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting Attest Document Intake Service");
    tracing::info!("Max file size: {} bytes", config.max_file_size_bytes);
    tracing::info!("Max batch size: {} bytes", config.max_total_size_bytes);
    tracing::info!("Max concurrent requests: {}", config.max_concurrent_requests);
    tracing::info!("Storage backend: {:?}", config.storage.backend);

    // Determine port from environment (Railway compatibility)
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server_port);
    let addr = format!("{}:{}", config.server_host, port);

    let state = AppState::from_config(config).await?;
    let app = create_router(state).layer(TraceLayer::new_for_http());

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
