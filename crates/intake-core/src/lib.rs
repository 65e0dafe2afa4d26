//! Intake Core Library
//!
//! This crate provides the domain model, error taxonomy, configuration and
//! display sanitization shared across all Intake components.

pub mod config;
pub mod error;
pub mod models;
pub mod sanitize;

// Re-export commonly used types
pub use config::{normalize_extension, Config, UploadPolicy};
pub use error::{ErrorMetadata, LogLevel, UploadError};
pub use models::{FileRecordResponse, FileRecordSummary, RecordUpdate, UploadedFileRecord};
pub use sanitize::escape_html;
