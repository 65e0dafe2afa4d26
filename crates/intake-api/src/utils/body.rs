//! Request body streaming for the upload pipeline

use axum::body::Body;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use http_body_util::LengthLimitError;
use intake_core::UploadError;

/// Data stream of `body` with read failures already classified.
///
/// Hitting the HTTP body limit is reported as `FileTooLarge`, the same outcome
/// the part reader gives for an oversized part. Anything else is a body that
/// could not be read.
pub fn upload_stream(
    body: Body,
    max_bytes: usize,
) -> impl Stream<Item = Result<Bytes, UploadError>> + Send + 'static {
    body.into_data_stream()
        .map_err(move |err| classify_read_error(&err, max_bytes))
}

fn classify_read_error(err: &axum::Error, max_bytes: usize) -> UploadError {
    if exceeded_length_limit(err) {
        tracing::debug!(max_bytes, "Request body limit reached");
        return UploadError::FileTooLarge { max_bytes };
    }
    UploadError::MalformedRequest(format!("failed to read request body: {}", err))
}

fn exceeded_length_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if err.is::<LengthLimitError>() {
            return true;
        }
        current = err.source();
    }
    false
}
