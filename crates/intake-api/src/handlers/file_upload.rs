use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use intake_core::FileRecordResponse;
use uuid::Uuid;

use crate::constants::API_PREFIX;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::body::upload_stream;
use crate::utils::precondition::{etag, required_if_match_version};

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// Upload file handler
///
/// Streams the multipart body through the upload pipeline. Only the first part
/// carrying a file name is stored; other fields before it are skipped.
///
/// # Errors
/// - `UploadError::UnsupportedMediaType` - Not `multipart/form-data` or no boundary
/// - `UploadError::NoFileInRequest` - No part carried a file
/// - `UploadError::FileTooLarge` - File exceeds the configured ceiling
/// - `UploadError::StorageFailure` - Store unavailable
#[utoipa::path(
    post,
    path = "/api/v0/files",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = FileRecordResponse),
        (status = 400, description = "Rejected by upload policy or malformed body", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not a multipart/form-data request", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, body), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, HttpAppError> {
    let max_bytes = state.uploads.validator().policy().max_bytes();
    let record = state
        .uploads
        .upload(content_type(&headers), upload_stream(body, max_bytes))
        .await
        .into_result()?;

    let location = format!("{}/files/{}", API_PREFIX, record.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        [(header::ETAG, etag(record.version))],
        Json(FileRecordResponse::from(&record)),
    ))
}

/// Replace the content (and declared name) of an existing record.
///
/// Requires `If-Match` with the current version. The new file passes the same
/// policy checks as a fresh upload.
#[utoipa::path(
    put,
    path = "/api/v0/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File record ID"),
        ("If-Match" = String, Header, description = "Current record version, e.g. \"1\"")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File replaced", body = FileRecordResponse),
        (status = 400, description = "Rejected by upload policy or missing If-Match", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 409, description = "Record was modified concurrently", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, body), fields(file_id = %id, operation = "replace_file"))]
pub async fn replace_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, HttpAppError> {
    let expected_version = required_if_match_version(&headers)?;
    let max_bytes = state.uploads.validator().policy().max_bytes();

    let record = state
        .uploads
        .replace(
            id,
            expected_version,
            content_type(&headers),
            upload_stream(body, max_bytes),
        )
        .await
        .into_result()?;

    Ok((
        [(header::ETAG, etag(record.version))],
        Json(FileRecordResponse::from(&record)),
    ))
}
