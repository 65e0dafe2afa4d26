//! Storage-agnostic file record store trait.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use intake_core::{FileRecordSummary, RecordUpdate, UploadError, UploadedFileRecord};
use uuid::Uuid;

/// Durable keyed storage of validated uploads.
///
/// Implementations must write each record atomically: a reader either sees the
/// whole record or none of it. Versions start at 1 and increase by one on every
/// successful update.
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    /// Persist a new record under a freshly allocated v4 id.
    async fn create(
        &self,
        declared_name: String,
        timestamp: DateTime<Utc>,
        content: Bytes,
    ) -> Result<UploadedFileRecord, UploadError>;

    /// `Ok(None)` when no record has this id.
    async fn get(&self, id: Uuid) -> Result<Option<UploadedFileRecord>, UploadError>;

    /// Metadata of every record, newest first.
    async fn list(&self) -> Result<Vec<FileRecordSummary>, UploadError>;

    /// Remove a record. Deleting a missing id succeeds.
    ///
    /// With `expected_version`, a record at any other version is left in place
    /// and `Conflict` is returned.
    async fn delete(&self, id: Uuid, expected_version: Option<i32>) -> Result<(), UploadError>;

    /// Apply `update` if the stored version is still `expected_version`.
    ///
    /// Missing id is `NotFound`, a different stored version is `Conflict`.
    async fn update(
        &self,
        id: Uuid,
        expected_version: i32,
        update: RecordUpdate,
    ) -> Result<UploadedFileRecord, UploadError>;

    /// Cheap reachability check for health endpoints.
    async fn health_check(&self) -> Result<(), UploadError>;

    /// Short backend name for logs and the health endpoint.
    fn backend_name(&self) -> &'static str;
}
