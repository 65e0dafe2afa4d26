//! Health check handler and response type.

use crate::constants::API_VERSION;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Run an async check with timeout; returns status string "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: &'static str,
    pub api_version: &'static str,
    pub store_backend: &'static str,
    pub store: String,
}

/// Liveness plus a store reachability check.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = run_check(CHECK_TIMEOUT, state.store.health_check(), "unhealthy").await;
    let healthy = store == "healthy";

    let status = if healthy {
        StatusCode::OK
    } else {
        tracing::warn!(store = %store, "Health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthCheckResponse {
            status: if healthy { "healthy" } else { "unhealthy" },
            api_version: API_VERSION,
            store_backend: state.store.backend_name(),
            store,
        }),
    )
}
