//! Record versions carried in `ETag` / `If-Match` headers.
//!
//! A record at version 3 has the strong entity tag `"3"`. Clients echo it back
//! in `If-Match` to make a write conditional on nobody else having written first.

use axum::http::{header, HeaderMap, HeaderValue};
use intake_core::UploadError;

pub fn etag(version: i32) -> HeaderValue {
    // digits and quotes only, always a valid header value
    HeaderValue::from_str(&format!("\"{}\"", version)).unwrap_or(HeaderValue::from_static("\"0\""))
}

/// Version from `If-Match`, if the header is present.
///
/// Accepts `"3"`, `W/"3"` and bare `3`. Anything else is malformed.
pub fn if_match_version(headers: &HeaderMap) -> Result<Option<i32>, UploadError> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| UploadError::MalformedRequest("If-Match must be ASCII".to_string()))?
        .trim();
    let tag = raw.strip_prefix("W/").unwrap_or(raw).trim_matches('"');

    match tag.parse::<i32>() {
        Ok(version) if version > 0 => Ok(Some(version)),
        _ => Err(UploadError::MalformedRequest(format!(
            "If-Match must carry a record version, got {:?}",
            raw
        ))),
    }
}

/// Like [`if_match_version`], for writes that must be conditional.
pub fn required_if_match_version(headers: &HeaderMap) -> Result<i32, UploadError> {
    if_match_version(headers)?.ok_or_else(|| {
        UploadError::MalformedRequest(
            "If-Match header with the current record version is required".to_string(),
        )
    })
}
