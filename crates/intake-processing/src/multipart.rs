//! Streaming multipart part reader
//!
//! A forward-only, single-pass view over a `multipart/form-data` body. Parts
//! are handed out one at a time; a part's body yields only its own bytes and
//! never anything past its closing boundary. The parser stops pulling from the
//! body once the whole stream, or any single part, passes its [`ReadLimits`].

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use http::header::CONTENT_DISPOSITION;
use http::HeaderMap;
use intake_core::{UploadError, UploadPolicy};

/// Headroom for boundaries, part headers and small form fields.
pub const DEFAULT_OVERHEAD_BYTES: usize = 64 * 1024;

/// Byte limits enforced while the parser reads from the body stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadLimits {
    /// Largest body any single part may have.
    pub per_part: usize,
    /// Largest number of bytes pulled from the stream for the whole request.
    pub whole_stream: usize,
}

impl ReadLimits {
    pub fn for_policy(policy: &UploadPolicy, overhead_bytes: usize) -> Self {
        Self {
            per_part: policy.max_bytes(),
            whole_stream: policy.max_bytes().saturating_add(overhead_bytes),
        }
    }

    fn too_large(&self) -> UploadError {
        UploadError::FileTooLarge {
            max_bytes: self.per_part,
        }
    }
}

/// Chunked access to the body of one part.
#[async_trait]
pub trait PartBody: Send {
    /// Next chunk of body bytes, `Ok(None)` once the part is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, UploadError>;
}

/// Lazy sequence of parts over a request body.
///
/// A stream error that is itself an [`UploadError`] is passed through as-is,
/// so the body source decides how its own failures are reported.
pub struct PartReader {
    inner: multer::Multipart<'static>,
    limits: ReadLimits,
    parts_read: usize,
}

impl PartReader {
    pub fn new<S, O, E>(body: S, boundary: impl Into<String>, limits: ReadLimits) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        let constraints = multer::Constraints::new().size_limit(
            multer::SizeLimit::new()
                .whole_stream(limits.whole_stream as u64)
                .per_field(limits.per_part as u64),
        );
        Self {
            inner: multer::Multipart::with_constraints(body, boundary, constraints),
            limits,
            parts_read: 0,
        }
    }

    /// Advance to the next part. `Ok(None)` marks the end of the sequence.
    ///
    /// The previous part must be dropped first, otherwise this fails as malformed.
    pub async fn next_part(&mut self) -> Result<Option<Part>, UploadError> {
        let limits = self.limits;
        let field = self
            .inner
            .next_field()
            .await
            .map_err(|err| map_multer_error(err, limits))?;
        Ok(field.map(|field| {
            let index = self.parts_read;
            self.parts_read += 1;
            Part {
                field,
                index,
                limits,
            }
        }))
    }

    pub fn parts_read(&self) -> usize {
        self.parts_read
    }
}

/// One part of a multipart body: raw headers plus a bounded body stream.
pub struct Part {
    field: multer::Field<'static>,
    index: usize,
    limits: ReadLimits,
}

impl Part {
    /// Zero-based position of this part in the body.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn headers(&self) -> &HeaderMap {
        self.field.headers()
    }

    /// Raw Content-Disposition header text, if present and valid UTF-8.
    ///
    /// Browsers send non-ASCII file names as raw UTF-8 inside `filename="..."`,
    /// which `HeaderValue::to_str` would refuse.
    pub fn content_disposition(&self) -> Option<&str> {
        self.headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
    }

    /// Read and discard the rest of this part; returns the number of bytes skipped.
    pub async fn drain(mut self) -> Result<u64, UploadError> {
        let mut skipped = 0u64;
        while let Some(chunk) = self.next_chunk().await? {
            skipped += chunk.len() as u64;
        }
        Ok(skipped)
    }
}

#[async_trait]
impl PartBody for Part {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, UploadError> {
        let limits = self.limits;
        self.field
            .chunk()
            .await
            .map_err(|err| map_multer_error(err, limits))
    }
}

fn map_multer_error(err: multer::Error, limits: ReadLimits) -> UploadError {
    match err {
        multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
            tracing::debug!(error = %err, "Multipart size limit reached");
            limits.too_large()
        }
        multer::Error::StreamReadFailed(source) => match source.downcast::<UploadError>() {
            Ok(reason) => *reason,
            Err(source) => {
                tracing::debug!(error = %source, "Request body read failed");
                UploadError::MalformedRequest(format!("failed to read request body: {}", source))
            }
        },
        err => {
            tracing::debug!(error = %err, "Multipart framing error");
            UploadError::MalformedRequest(err.to_string())
        }
    }
}
