//! Intake Processing Library
//!
//! Streaming multipart decomposition and per-part upload policy enforcement.
//! Nothing in this crate touches persistent storage.

pub mod boundary;
pub mod disposition;
pub mod multipart;
pub mod signatures;
pub mod validator;

pub use boundary::extract_boundary;
pub use disposition::ContentDisposition;
pub use multipart::{Part, PartBody, PartReader, ReadLimits, DEFAULT_OVERHEAD_BYTES};
pub use validator::{validate_policy, PartValidator, PartVerdict, ValidatedFile};
