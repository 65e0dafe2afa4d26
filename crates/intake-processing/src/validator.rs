use bytes::Bytes;
use intake_core::{normalize_extension, UploadError, UploadPolicy};

use crate::disposition::ContentDisposition;
use crate::multipart::PartBody;
use crate::signatures;

/// Content that passed every policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFile {
    /// Untrusted, for display only
    pub declared_name: String,
    /// Normalized declared extension, e.g. `.jpg`
    pub extension: String,
    pub content: Bytes,
}

impl ValidatedFile {
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Result of running the validator over one part.
#[derive(Debug)]
pub enum PartVerdict {
    /// Not a file field (no `form-data` disposition or no file name). Skip it.
    NotApplicable,
    Accepted(ValidatedFile),
}

/// Per-part upload policy enforcement
///
/// Checks, in order: declared extension against the allowlist, byte ceiling
/// while streaming, non-empty content, and leading bytes against the content
/// signature of the declared extension. Stateless apart from the policy, so
/// one validator can serve any number of concurrent uploads.
#[derive(Debug, Clone)]
pub struct PartValidator {
    policy: UploadPolicy,
}

impl PartValidator {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validate one part given its raw Content-Disposition and body.
    ///
    /// The body is only read when the part is a file field with an allowed
    /// extension, and never more than `max_bytes` of it is buffered.
    pub async fn validate<B>(
        &self,
        content_disposition: Option<&str>,
        body: &mut B,
    ) -> Result<PartVerdict, UploadError>
    where
        B: PartBody + ?Sized,
    {
        let Some(disposition) = content_disposition.and_then(ContentDisposition::parse) else {
            return Ok(PartVerdict::NotApplicable);
        };
        if !disposition.is_form_data() {
            return Ok(PartVerdict::NotApplicable);
        }
        let Some(declared_name) = disposition.declared_file_name() else {
            return Ok(PartVerdict::NotApplicable);
        };

        let extension = self.validate_extension(declared_name)?;
        let content = self.read_bounded(body).await?;
        let file = self.check_content(declared_name, extension, content)?;

        tracing::debug!(
            extension = %file.extension,
            size_bytes = file.size(),
            "Part passed upload policy"
        );
        Ok(PartVerdict::Accepted(file))
    }

    /// Run the extension, emptiness and signature checks over bytes already in
    /// memory, e.g. replacement content for an existing record.
    pub fn validate_buffer(
        &self,
        declared_name: &str,
        content: Bytes,
    ) -> Result<ValidatedFile, UploadError> {
        let extension = self.validate_extension(declared_name)?;
        if content.len() > self.policy.max_bytes() {
            return Err(UploadError::FileTooLarge {
                max_bytes: self.policy.max_bytes(),
            });
        }
        self.check_content(declared_name, extension, content)
    }

    /// Normalized extension of `declared_name`, if it is on the allowlist.
    pub fn validate_extension(&self, declared_name: &str) -> Result<String, UploadError> {
        match declared_extension(declared_name) {
            Some(extension) if self.policy.allows(&extension) => Ok(extension),
            extension => Err(UploadError::ExtensionNotAllowed {
                extension,
                allowed: self.policy.allowed_list(),
            }),
        }
    }

    /// Buffer the whole body, failing as soon as it would exceed the ceiling.
    /// The chunk that crosses the limit is never appended.
    pub async fn read_bounded<B>(&self, body: &mut B) -> Result<Bytes, UploadError>
    where
        B: PartBody + ?Sized,
    {
        let max_bytes = self.policy.max_bytes();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next_chunk().await? {
            if chunk.len() > max_bytes - buffer.len() {
                tracing::debug!(
                    max_bytes,
                    buffered = buffer.len(),
                    chunk_len = chunk.len(),
                    "Upload exceeded size ceiling, aborting read"
                );
                return Err(UploadError::FileTooLarge { max_bytes });
            }
            reserve_within(&mut buffer, chunk.len(), max_bytes);
            buffer.extend_from_slice(&chunk);
        }

        Ok(Bytes::from(buffer))
    }

    fn check_content(
        &self,
        declared_name: &str,
        extension: String,
        content: Bytes,
    ) -> Result<ValidatedFile, UploadError> {
        if content.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        if !signatures::matches_extension(&extension, &content) {
            let inspected = signatures::max_signature_len(&extension).max(8);
            tracing::debug!(
                extension = %extension,
                leading_bytes = ?&content[..content.len().min(inspected)],
                "Content signature does not match declared extension"
            );
            return Err(UploadError::ContentMismatch { extension });
        }

        Ok(ValidatedFile {
            declared_name: declared_name.to_string(),
            extension,
            content,
        })
    }
}

/// Make room for `additional` more bytes, doubling capacity but never past
/// `ceiling`. Callers guarantee `buffer.len() + additional <= ceiling`.
fn reserve_within(buffer: &mut Vec<u8>, additional: usize, ceiling: usize) {
    let needed = buffer.len() + additional;
    if needed <= buffer.capacity() {
        return;
    }
    let target = needed.max(buffer.capacity().saturating_mul(2)).min(ceiling);
    buffer.reserve_exact(target - buffer.len());
}

/// Extension of the final path segment of a client-supplied name, normalized.
///
/// Both `/` and `\` count as separators, since browsers on Windows have been
/// known to send full paths. Dotfiles without a further dot have no extension.
pub fn declared_extension(declared_name: &str) -> Option<String> {
    let file_name = declared_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(declared_name);
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => normalize_extension(&file_name[idx..]),
    }
}

/// Fail when an allowed extension has no known content signature, since uploads
/// with that extension could never be verified.
pub fn validate_policy(policy: &UploadPolicy) -> Result<(), anyhow::Error> {
    let unverifiable: Vec<&str> = policy
        .allowed_extensions()
        .iter()
        .filter(|ext| signatures::signatures_for(ext).is_none())
        .map(String::as_str)
        .collect();

    if !unverifiable.is_empty() {
        return Err(anyhow::anyhow!(
            "ALLOWED_EXTENSIONS contains extensions without a known content signature: {}",
            unverifiable.join(", ")
        ));
    }
    Ok(())
}
