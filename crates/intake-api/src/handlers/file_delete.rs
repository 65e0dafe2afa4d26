use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::precondition::if_match_version;

/// Delete a record. Deleting an id that does not exist also returns 204.
#[utoipa::path(
    delete,
    path = "/api/v0/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File record ID"),
        ("If-Match" = Option<String>, Header, description = "Only delete if the record is at this version")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 409, description = "Record is at a different version", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers), fields(file_id = %id, operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, HttpAppError> {
    let expected_version = if_match_version(&headers)?;
    state.store.delete(id, expected_version).await?;
    Ok(StatusCode::NO_CONTENT)
}
