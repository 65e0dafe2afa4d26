//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use intake_core::Config;
use intake_processing::ReadLimits;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(&config.environment)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    // Every allowed extension needs a content signature, otherwise its uploads always fail
    intake_processing::validate_policy(&config.upload_policy)
        .context("Configuration validation failed")?;

    tracing::info!("Configuration loaded and validated successfully");

    let store = database::setup_store(&config).await?;
    let limits = ReadLimits::for_policy(&config.upload_policy, config.multipart_overhead_bytes);
    let state = Arc::new(AppState::new(config.upload_policy.clone(), limits, store));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
