//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use intake_core::models;

/// Returns the OpenAPI document served at `/api/openapi.json`.
pub fn get_openapi_doc() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Intake API",
        version = "0.1.0",
        description = "Validated file uploads. Every upload is checked against an extension allowlist, a size ceiling enforced while streaming, and the content signature of its declared type before it is stored. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::file_upload::upload_file,
        handlers::file_upload::replace_file,
        handlers::file_get::list_files,
        handlers::file_get::get_file,
        handlers::file_download::download_file,
        handlers::file_update::rename_file,
        handlers::file_delete::delete_file,
    ),
    components(
        schemas(
            models::FileRecordResponse,
            handlers::file_update::RenameRequest,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "files", description = "Upload, inspect, replace and delete validated files")
    )
)]
pub struct ApiDoc;
