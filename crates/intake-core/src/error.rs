//! Error types module
//!
//! `UploadError` is the single outcome taxonomy of the upload pipeline and the
//! file record store. Every variant is a distinct, matchable outcome: callers
//! branch on the kind (too big vs. wrong content vs. stale version) instead of
//! inspecting messages.
//!
//! The `From<sqlx::Error>` conversion is gated behind the `sqlx` feature.

use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for request-shape problems worth noticing
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported media type: expected multipart/form-data with a boundary")]
    UnsupportedMediaType,

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("No file data in the request")]
    NoFileInRequest,

    #[error("File extension {extension:?} is not allowed (allowed: {allowed:?})")]
    ExtensionNotAllowed {
        extension: Option<String>,
        allowed: Vec<String>,
    },

    #[error("File exceeds the maximum allowed size of {max_bytes} bytes")]
    FileTooLarge { max_bytes: usize },

    #[error("Empty file")]
    EmptyFile,

    #[error("File content does not match the declared extension {extension}")]
    ContentMismatch { extension: String },

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("File record not found: {0}")]
    NotFound(Uuid),

    #[error("File record {id} was modified concurrently (expected version {expected})")]
    Conflict { id: Uuid, expected: i32 },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for UploadError {
    fn from(err: SqlxError) -> Self {
        UploadError::StorageFailure(err.to_string())
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::StorageFailure(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn upload_error_static_metadata(
    err: &UploadError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        UploadError::UnsupportedMediaType => (
            415,
            "UNSUPPORTED_MEDIA_TYPE",
            false,
            Some("Send the file as multipart/form-data"),
            false,
            LogLevel::Debug,
        ),
        UploadError::MalformedRequest(_) => (
            400,
            "MALFORMED_REQUEST",
            false,
            Some("Check the multipart framing of the request body"),
            false,
            LogLevel::Warn,
        ),
        UploadError::NoFileInRequest => (
            400,
            "NO_FILE_IN_REQUEST",
            false,
            Some("Attach a file part with a file name"),
            false,
            LogLevel::Debug,
        ),
        UploadError::ExtensionNotAllowed { .. } => (
            400,
            "EXTENSION_NOT_ALLOWED",
            false,
            Some("Upload a file with one of the allowed extensions"),
            false,
            LogLevel::Debug,
        ),
        UploadError::FileTooLarge { .. } => (
            413,
            "FILE_TOO_LARGE",
            false,
            Some("Reduce file size below the configured limit"),
            false,
            LogLevel::Debug,
        ),
        UploadError::EmptyFile => (
            400,
            "EMPTY_FILE",
            false,
            Some("Upload a non-empty file"),
            false,
            LogLevel::Debug,
        ),
        UploadError::ContentMismatch { .. } => (
            400,
            "CONTENT_MISMATCH",
            false,
            Some("Make sure the file content matches its extension"),
            false,
            LogLevel::Debug,
        ),
        UploadError::StorageFailure(_) => (
            503,
            "STORAGE_FAILURE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        UploadError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the file ID exists"),
            false,
            LogLevel::Debug,
        ),
        UploadError::Conflict { .. } => (
            409,
            "CONFLICT",
            false,
            Some("Reload the file record and retry with its current version"),
            false,
            LogLevel::Debug,
        ),
    }
}

impl UploadError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            UploadError::UnsupportedMediaType => "UnsupportedMediaType",
            UploadError::MalformedRequest(_) => "MalformedRequest",
            UploadError::NoFileInRequest => "NoFileInRequest",
            UploadError::ExtensionNotAllowed { .. } => "ExtensionNotAllowed",
            UploadError::FileTooLarge { .. } => "FileTooLarge",
            UploadError::EmptyFile => "EmptyFile",
            UploadError::ContentMismatch { .. } => "ContentMismatch",
            UploadError::StorageFailure(_) => "StorageFailure",
            UploadError::NotFound(_) => "NotFound",
            UploadError::Conflict { .. } => "Conflict",
        }
    }

    /// True for the policy rejections a client can trigger with file content alone.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            UploadError::ExtensionNotAllowed { .. }
                | UploadError::FileTooLarge { .. }
                | UploadError::EmptyFile
                | UploadError::ContentMismatch { .. }
        )
    }
}

impl ErrorMetadata for UploadError {
    fn http_status_code(&self) -> u16 {
        upload_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        upload_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        upload_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::StorageFailure(_) => "Failed to access file storage".to_string(),
            UploadError::MalformedRequest(_) => "Malformed multipart request".to_string(),
            UploadError::ExtensionNotAllowed { allowed, .. } => format!(
                "File extension is not allowed. Allowed extensions: {}",
                allowed.join(", ")
            ),
            UploadError::ContentMismatch { .. } => {
                "File content does not match its extension".to_string()
            }
            other => other.to_string(),
        }
    }
}
