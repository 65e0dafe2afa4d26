use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::sanitize::escape_html;

/// A persisted, validated upload.
///
/// `declared_name` is client-supplied and untrusted: it is display data only
/// and must go through [`escape_html`] before it is rendered anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFileRecord {
    pub id: Uuid,
    pub declared_name: String,
    pub timestamp: DateTime<Utc>,
    pub size: i64,
    pub content: Bytes,
    pub version: i32,
}

impl UploadedFileRecord {
    /// Build a first-version record; `size` is taken from `content`.
    pub fn new(id: Uuid, declared_name: String, timestamp: DateTime<Utc>, content: Bytes) -> Self {
        Self {
            id,
            declared_name,
            timestamp,
            size: content.len() as i64,
            content,
            version: 1,
        }
    }

    pub fn escaped_name(&self) -> String {
        escape_html(&self.declared_name)
    }

    pub fn summary(&self) -> FileRecordSummary {
        FileRecordSummary {
            id: self.id,
            declared_name: self.declared_name.clone(),
            timestamp: self.timestamp,
            size: self.size,
            version: self.version,
        }
    }
}

/// Record metadata without the content bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecordSummary {
    pub id: Uuid,
    pub declared_name: String,
    pub timestamp: DateTime<Utc>,
    pub size: i64,
    pub version: i32,
}

/// Replacement fields for an existing record. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    pub declared_name: Option<String>,
    /// Must already have passed the upload policy.
    pub content: Option<Bytes>,
}

impl RecordUpdate {
    pub fn rename(declared_name: impl Into<String>) -> Self {
        Self {
            declared_name: Some(declared_name.into()),
            content: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declared_name.is_none() && self.content.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileRecordResponse {
    pub id: Uuid,
    /// HTML-escaped declared file name
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub size: i64,
    pub version: i32,
}

impl From<FileRecordSummary> for FileRecordResponse {
    fn from(summary: FileRecordSummary) -> Self {
        Self {
            id: summary.id,
            name: escape_html(&summary.declared_name),
            timestamp: summary.timestamp,
            size: summary.size,
            version: summary.version,
        }
    }
}

impl From<&UploadedFileRecord> for FileRecordResponse {
    fn from(record: &UploadedFileRecord) -> Self {
        record.summary().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_size_matches_content() {
        let record = UploadedFileRecord::new(
            Uuid::new_v4(),
            "a.jpg".to_string(),
            Utc::now(),
            Bytes::from_static(b"\xFF\xD8\xFF\xE0abc"),
        );
        assert_eq!(record.size, 7);
        assert_eq!(record.version, 1);
    }

    #[test]
    fn test_response_escapes_declared_name() {
        let record = UploadedFileRecord::new(
            Uuid::new_v4(),
            "<script>alert(1)</script>.jpg".to_string(),
            Utc::now(),
            Bytes::from_static(b"x"),
        );
        let response = FileRecordResponse::from(&record);
        assert_eq!(
            response.name,
            "&lt;script&gt;alert(1)&lt;/script&gt;.jpg"
        );
        assert_eq!(response.size, 1);
    }

    #[test]
    fn test_record_update_is_empty() {
        assert!(RecordUpdate::default().is_empty());
        assert!(!RecordUpdate::rename("b.jpg").is_empty());
    }
}
