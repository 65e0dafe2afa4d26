//! Upload orchestration
//!
//! Drives one request through boundary extraction, part reading, policy
//! validation and persistence.

mod service;
mod types;

pub use service::UploadService;
pub use types::{PersistTarget, UploadOutcome};
