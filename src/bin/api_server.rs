//! API server binary entry point.
//!
//! Usage: cargo run --features api --bin api_server

use crop_advisor_rust::{create_router, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Default log level: info for our crate, warn for others
                "crop_advisor_rust=info,tower_http=debug,axum=debug,warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Configuration from environment variables
    let reference_path = std::env::var("REFERENCE_TABLE").ok().map(PathBuf::from);
    let sensor_path = std::env::var("SENSOR_DATA").ok();
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    tracing::info!("Configuration:");
    tracing::info!("  REFERENCE_TABLE: {:?}", reference_path);
    tracing::info!("  SENSOR_DATA: {:?}", sensor_path);
    tracing::info!("  PORT: {}", port);

    // Initialize application state (loads reference table + sensor corpus)
    let state = AppState::load(reference_path.as_deref(), sensor_path.as_deref())?;
    if !state.classifier.is_available() {
        tracing::warn!("no classifier model attached; /api/predict_crop will return an error payload");
    }
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
