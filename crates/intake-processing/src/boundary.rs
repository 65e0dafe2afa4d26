//! Multipart boundary extraction from a negotiated Content-Type header

use intake_core::UploadError;

/// RFC 2046 upper bound on boundary length.
const MAX_BOUNDARY_LENGTH: usize = 70;

/// Extract the boundary token of a `multipart/form-data` content type.
///
/// Anything that is not a form submission, or that lacks a usable boundary,
/// is `UnsupportedMediaType`. Pure function: it never sees the body.
pub fn extract_boundary(content_type: Option<&str>) -> Result<String, UploadError> {
    let content_type = content_type.ok_or(UploadError::UnsupportedMediaType)?;

    let boundary = multer::parse_boundary(content_type).map_err(|e| {
        tracing::debug!(error = %e, content_type = %content_type, "Rejected content type");
        UploadError::UnsupportedMediaType
    })?;

    let boundary = boundary.trim_matches('"');
    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LENGTH {
        tracing::debug!(
            boundary_length = boundary.len(),
            "Rejected multipart boundary length"
        );
        return Err(UploadError::UnsupportedMediaType);
    }

    Ok(boundary.to_string())
}
