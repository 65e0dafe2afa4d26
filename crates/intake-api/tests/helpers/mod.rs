//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p intake-api --test files_test`.
//! Every test app gets its own in-memory store.

pub mod fixtures;

use axum_test::TestServer;
use intake_api::constants;
use intake_api::setup::routes;
use intake_api::state::AppState;
use intake_core::{Config, UploadPolicy};
use intake_db::InMemoryFileRecordStore;
use intake_processing::ReadLimits;
use std::sync::Arc;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus a handle on its store.
pub struct TestApp {
    pub server: TestServer,
    pub store: InMemoryFileRecordStore,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn create_test_config() -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        database_url: None,
        db_max_connections: 1,
        db_timeout_seconds: 5,
        upload_policy: UploadPolicy::default(),
        multipart_overhead_bytes: 64 * 1024,
        request_timeout_secs: 30,
        max_concurrent_uploads: 8,
        cors_origins: vec!["*".to_string()],
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(create_test_config())
}

pub fn setup_test_app_with(config: Config) -> TestApp {
    let store = InMemoryFileRecordStore::new();
    let limits = ReadLimits::for_policy(&config.upload_policy, config.multipart_overhead_bytes);
    let state = Arc::new(AppState::new(
        config.upload_policy.clone(),
        limits,
        Arc::new(store.clone()),
    ));
    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp { server, store }
}
