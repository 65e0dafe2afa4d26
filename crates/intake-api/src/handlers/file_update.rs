use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use intake_core::FileRecordResponse;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::precondition::etag;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameRequest {
    /// New declared file name; must keep an allowed extension matching the content
    pub declared_name: String,
    /// Version the client last saw
    pub version: i32,
}

/// Metadata-only update: changes the declared name, never the content.
#[utoipa::path(
    patch,
    path = "/api/v0/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File record ID")
    ),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "File renamed", body = FileRecordResponse),
        (status = 400, description = "Invalid name or body", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 409, description = "Record was modified concurrently", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(file_id = %id, operation = "rename_file"))]
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RenameRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .uploads
        .rename(id, request.version, request.declared_name.trim().to_string())
        .await?;

    Ok((
        [(header::ETAG, etag(record.version))],
        Json(FileRecordResponse::from(&record)),
    ))
}
