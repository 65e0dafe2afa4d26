//! Route configuration and setup.
//!
//! File routes are nested under the versioned prefix; health checks live in [health](health).

mod health;

use crate::api_doc;
use crate::constants::{API_BASE, API_PREFIX};
use crate::handlers::{file_delete, file_download, file_get, file_update, file_upload};
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use intake_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Upload ceiling plus room for boundaries, part headers and small fields.
    // Upload handlers stream the raw body, so this layer is the only HTTP limit.
    let body_limit = config.request_body_limit();
    tracing::info!(
        body_limit,
        request_timeout_secs = config.request_timeout_secs,
        max_concurrent_uploads = config.max_concurrent_uploads,
        "HTTP limits configured"
    );

    let app = Router::new()
        .nest(API_PREFIX, file_routes())
        .route("/health", get(health::health_check))
        .route(
            &format!("{}/openapi.json", API_BASE),
            get(|| async { Json(api_doc::get_openapi_doc()) }),
        )
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_uploads))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn file_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/files",
            post(file_upload::upload_file).get(file_get::list_files),
        )
        .route(
            "/files/{id}",
            get(file_get::get_file)
                .put(file_upload::replace_file)
                .patch(file_update::rename_file)
                .delete(file_delete::delete_file),
        )
        .route("/files/{id}/content", get(file_download::download_file))
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
            .expose_headers([header::ETAG, header::LOCATION])
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS_ORIGINS entry: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
            .expose_headers([header::ETAG, header::LOCATION])
    };
    Ok(cors)
}
