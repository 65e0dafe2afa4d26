//! Upload orchestrator
//!
//! Each call runs the state machine
//! `AwaitingBoundary -> ReadingParts -> Validating -> Persisting -> Done`,
//! where any step may end in `Rejected`. Only the first file-bearing part is
//! considered; nothing after it is read. No shared state is touched before
//! `Persisting`.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use intake_core::{RecordUpdate, UploadError, UploadPolicy, UploadedFileRecord};
use intake_db::FileRecordStore;
use intake_processing::{
    extract_boundary, PartReader, PartValidator, PartVerdict, ReadLimits, ValidatedFile,
    DEFAULT_OVERHEAD_BYTES,
};
use uuid::Uuid;

use super::types::{PersistTarget, UploadOutcome, UploadStep};

#[derive(Clone)]
pub struct UploadService {
    validator: PartValidator,
    limits: ReadLimits,
    store: Arc<dyn FileRecordStore>,
}

impl UploadService {
    pub fn new(policy: UploadPolicy, store: Arc<dyn FileRecordStore>) -> Self {
        Self {
            limits: ReadLimits::for_policy(&policy, DEFAULT_OVERHEAD_BYTES),
            validator: PartValidator::new(policy),
            store,
        }
    }

    /// Replace the parser limits derived from the policy.
    pub fn with_read_limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn validator(&self) -> &PartValidator {
        &self.validator
    }

    /// Validate and store the first file of a multipart body as a new record.
    pub async fn upload<S, O, E>(&self, content_type: Option<&str>, body: S) -> UploadOutcome
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        self.run(content_type, body, PersistTarget::Create).await
    }

    /// Validate the first file of a multipart body and write it over record `id`,
    /// provided the record is still at `expected_version`.
    pub async fn replace<S, O, E>(
        &self,
        id: Uuid,
        expected_version: i32,
        content_type: Option<&str>,
        body: S,
    ) -> UploadOutcome
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        let target = PersistTarget::Replace {
            id,
            expected_version,
        };
        self.run(content_type, body, target).await
    }

    /// Change only the declared name of a record.
    ///
    /// The new name must carry an allowed extension whose signature the stored
    /// content matches, so a rename cannot relabel content as another type.
    pub async fn rename(
        &self,
        id: Uuid,
        expected_version: i32,
        declared_name: String,
    ) -> Result<UploadedFileRecord, UploadError> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or(UploadError::NotFound(id))?;
        if record.version != expected_version {
            return Err(UploadError::Conflict {
                id,
                expected: expected_version,
            });
        }

        // The stored bytes must still pass under the new name.
        self.validator.validate_buffer(&declared_name, record.content)?;

        self.store
            .update(id, expected_version, RecordUpdate::rename(declared_name))
            .await
    }

    async fn run<S, O, E>(
        &self,
        content_type: Option<&str>,
        body: S,
        target: PersistTarget,
    ) -> UploadOutcome
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        let mut step = UploadStep::AwaitingBoundary(body);

        loop {
            tracing::debug!(step = step.name(), "Upload step");

            step = match step {
                UploadStep::AwaitingBoundary(body) => match extract_boundary(content_type) {
                    Ok(boundary) => {
                        UploadStep::ReadingParts(PartReader::new(body, boundary, self.limits))
                    },
                    Err(reason) => UploadStep::Rejected(reason),
                },

                UploadStep::ReadingParts(mut reader) => match reader.next_part().await {
                    Ok(Some(part)) => UploadStep::Validating { reader, part },
                    Ok(None) => UploadStep::Rejected(UploadError::NoFileInRequest),
                    Err(reason) => UploadStep::Rejected(reason),
                },

                UploadStep::Validating { reader, mut part } => {
                    let disposition = part.content_disposition().map(str::to_owned);
                    match self.validator.validate(disposition.as_deref(), &mut part).await {
                        Ok(PartVerdict::Accepted(file)) => UploadStep::Persisting(file),
                        Ok(PartVerdict::NotApplicable) => {
                            let index = part.index();
                            match part.drain().await {
                                Ok(skipped_bytes) => {
                                    tracing::debug!(
                                        part_index = index,
                                        skipped_bytes,
                                        "Skipped non-file part"
                                    );
                                    UploadStep::ReadingParts(reader)
                                }
                                Err(reason) => UploadStep::Rejected(reason),
                            }
                        }
                        Err(reason) => UploadStep::Rejected(reason),
                    }
                }

                UploadStep::Persisting(file) => match self.persist(file, target).await {
                    Ok(record) => UploadStep::Done(record),
                    Err(reason) => UploadStep::Rejected(reason),
                },

                UploadStep::Done(record) => {
                    tracing::info!(
                        file_id = %record.id,
                        size_bytes = record.size,
                        version = record.version,
                        declared_name = %record.escaped_name(),
                        "File stored"
                    );
                    return UploadOutcome::Stored(record);
                }

                UploadStep::Rejected(reason) => {
                    tracing::debug!(
                        error_type = reason.error_type(),
                        policy_rejection = reason.is_policy_rejection(),
                        "Upload rejected"
                    );
                    return UploadOutcome::Rejected(reason);
                }
            };
        }
    }

    async fn persist(
        &self,
        file: ValidatedFile,
        target: PersistTarget,
    ) -> Result<UploadedFileRecord, UploadError> {
        match target {
            PersistTarget::Create => {
                self.store
                    .create(file.declared_name, Utc::now(), file.content)
                    .await
            }
            PersistTarget::Replace {
                id,
                expected_version,
            } => {
                let update = RecordUpdate {
                    declared_name: Some(file.declared_name),
                    content: Some(file.content),
                };
                self.store.update(id, expected_version, update).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use futures::stream;
    use intake_core::FileRecordSummary;
    use intake_db::InMemoryFileRecordStore;
    use std::convert::Infallible;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::task::Poll;

    const BOUNDARY: &str = "XyZ";
    const CONTENT_TYPE: &str = "multipart/form-data; boundary=XyZ";

    fn jpeg(len: usize) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        data.resize(len, 0x42);
        data
    }

    fn file_part(name: &str) -> String {
        format!(r#"form-data; name="file"; filename="{}""#, name)
    }

    fn form(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (disposition, content) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(format!("Content-Disposition: {}\r\n\r\n", disposition).as_bytes());
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn chunked(
        body: Vec<u8>,
        chunk_len: usize,
    ) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        let chunks: Vec<Result<Bytes, Infallible>> = body
            .chunks(chunk_len)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(chunks)
    }

    fn service_with_store() -> (UploadService, InMemoryFileRecordStore) {
        let store = InMemoryFileRecordStore::new();
        let service = UploadService::new(UploadPolicy::default(), Arc::new(store.clone()));
        (service, store)
    }

    /// Store whose every operation fails as unreachable.
    struct UnavailableStore;

    #[async_trait]
    impl FileRecordStore for UnavailableStore {
        async fn create(
            &self,
            _declared_name: String,
            _timestamp: DateTime<Utc>,
            _content: Bytes,
        ) -> Result<UploadedFileRecord, UploadError> {
            Err(UploadError::StorageFailure("database unreachable".to_string()))
        }

        async fn get(&self, _id: Uuid) -> Result<Option<UploadedFileRecord>, UploadError> {
            Err(UploadError::StorageFailure("database unreachable".to_string()))
        }

        async fn list(&self) -> Result<Vec<FileRecordSummary>, UploadError> {
            Err(UploadError::StorageFailure("database unreachable".to_string()))
        }

        async fn delete(&self, _id: Uuid, _expected: Option<i32>) -> Result<(), UploadError> {
            Err(UploadError::StorageFailure("database unreachable".to_string()))
        }

        async fn update(
            &self,
            _id: Uuid,
            _expected: i32,
            _update: RecordUpdate,
        ) -> Result<UploadedFileRecord, UploadError> {
            Err(UploadError::StorageFailure("database unreachable".to_string()))
        }

        async fn health_check(&self) -> Result<(), UploadError> {
            Err(UploadError::StorageFailure("database unreachable".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "unavailable"
        }
    }

    #[tokio::test]
    async fn test_stores_valid_jpeg_unchanged() {
        let (service, store) = service_with_store();
        let content = jpeg(1000);
        let body = form(&[(file_part("a.jpg"), content.clone())]);

        let record = service
            .upload(Some(CONTENT_TYPE), chunked(body, 97))
            .await
            .into_result()
            .unwrap();
        assert_eq!(record.size, 1000);
        assert_eq!(record.declared_name, "a.jpg");

        let stored = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(&stored.content[..], &content[..]);
    }

    #[tokio::test]
    async fn test_rejects_disallowed_extension() {
        let (service, store) = service_with_store();
        let body = form(&[(file_part("a.exe"), jpeg(1000))]);

        let outcome = service.upload(Some(CONTENT_TYPE), chunked(body, 512)).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::ExtensionNotAllowed { .. })
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_rejects_eleven_mib_of_zeros() {
        let (service, store) = service_with_store();
        let body = form(&[(file_part("big.jpg"), vec![0u8; 11 * 1048576])]);

        let outcome = service.upload(Some(CONTENT_TYPE), chunked(body, 65536)).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::FileTooLarge { max_bytes }) if max_bytes == 10 * 1048576
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_rejects_text_named_jpg() {
        let (service, store) = service_with_store();
        let body = form(&[(file_part("a.jpg"), b"hello, this is plain text".to_vec())]);

        let outcome = service.upload(Some(CONTENT_TYPE), chunked(body, 512)).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::ContentMismatch { .. })
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_non_multipart_never_reads_body() {
        let (service, store) = service_with_store();
        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        let body = stream::poll_fn(move |_| -> Poll<Option<Result<Bytes, Infallible>>> {
            flag.store(true, Ordering::SeqCst);
            Poll::Ready(None)
        });

        let outcome = service.upload(Some("application/json"), body).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::UnsupportedMediaType)
        ));
        assert!(!polled.load(Ordering::SeqCst));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_unsupported() {
        let (service, _store) = service_with_store();
        let outcome = service.upload(None, chunked(form(&[]), 16)).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::UnsupportedMediaType)
        ));
    }

    #[tokio::test]
    async fn test_body_without_file_part() {
        let (service, _store) = service_with_store();
        let body = form(&[(r#"form-data; name="caption""#.to_string(), b"hi".to_vec())]);

        let outcome = service.upload(Some(CONTENT_TYPE), chunked(body, 512)).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::NoFileInRequest)
        ));
    }

    #[tokio::test]
    async fn test_skips_fields_before_file() {
        let (service, _store) = service_with_store();
        let body = form(&[
            (r#"form-data; name="caption""#.to_string(), b"holiday".to_vec()),
            (file_part("a.jpg"), jpeg(64)),
        ]);

        let outcome = service.upload(Some(CONTENT_TYPE), chunked(body, 7)).await;
        assert!(outcome.is_stored());
    }

    #[tokio::test]
    async fn test_first_file_wins() {
        let (service, store) = service_with_store();
        let body = form(&[
            (file_part("first.jpg"), jpeg(64)),
            (file_part("second.exe"), b"MZ".to_vec()),
        ]);

        let record = service
            .upload(Some(CONTENT_TYPE), chunked(body, 512))
            .await
            .into_result()
            .unwrap();
        assert_eq!(record.declared_name, "first.jpg");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_first_file_is_not_rescued_by_second() {
        let (service, store) = service_with_store();
        let body = form(&[
            (file_part("first.jpg"), Vec::new()),
            (file_part("second.jpg"), jpeg(64)),
        ]);

        let outcome = service.upload(Some(CONTENT_TYPE), chunked(body, 512)).await;
        assert!(matches!(outcome, UploadOutcome::Rejected(UploadError::EmptyFile)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_truncated_body_is_malformed() {
        let (service, store) = service_with_store();
        let mut body = form(&[(file_part("a.jpg"), jpeg(64))]);
        body.truncate(body.len() - 20);

        let outcome = service.upload(Some(CONTENT_TYPE), chunked(body, 512)).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::MalformedRequest(_))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_storage_failure() {
        let service = UploadService::new(UploadPolicy::default(), Arc::new(UnavailableStore));
        let body = form(&[(file_part("a.jpg"), jpeg(64))]);

        let outcome = service.upload(Some(CONTENT_TYPE), chunked(body, 512)).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::StorageFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_revalidates_and_checks_version() {
        let (service, store) = service_with_store();
        let original = store
            .create("a.jpg".to_string(), Utc::now(), Bytes::from(jpeg(16)))
            .await
            .unwrap();

        let bad = form(&[(file_part("b.jpg"), b"not an image".to_vec())]);
        let outcome = service
            .replace(original.id, 1, Some(CONTENT_TYPE), chunked(bad, 512))
            .await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::ContentMismatch { .. })
        ));

        let good = form(&[(file_part("b.jpg"), jpeg(32))]);
        let replaced = service
            .replace(original.id, 1, Some(CONTENT_TYPE), chunked(good.clone(), 512))
            .await
            .into_result()
            .unwrap();
        assert_eq!(replaced.version, 2);
        assert_eq!(replaced.size, 32);
        assert_eq!(replaced.declared_name, "b.jpg");

        let stale = service
            .replace(original.id, 1, Some(CONTENT_TYPE), chunked(good, 512))
            .await;
        assert!(matches!(
            stale,
            UploadOutcome::Rejected(UploadError::Conflict { expected: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_unknown_id_is_not_found() {
        let (service, _store) = service_with_store();
        let id = Uuid::new_v4();
        let body = form(&[(file_part("a.jpg"), jpeg(32))]);

        let outcome = service.replace(id, 1, Some(CONTENT_TYPE), chunked(body, 512)).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_rename() {
        let (service, store) = service_with_store();
        let record = store
            .create("a.jpg".to_string(), Utc::now(), Bytes::from(jpeg(16)))
            .await
            .unwrap();

        let renamed = service
            .rename(record.id, 1, "holiday.JPG".to_string())
            .await
            .unwrap();
        assert_eq!(renamed.declared_name, "holiday.JPG");
        assert_eq!(renamed.version, 2);
        assert_eq!(renamed.content, record.content);

        assert!(matches!(
            service.rename(record.id, 2, "payload.exe".to_string()).await,
            Err(UploadError::ExtensionNotAllowed { .. })
        ));
        assert!(matches!(
            service.rename(record.id, 1, "again.jpg".to_string()).await,
            Err(UploadError::Conflict { .. })
        ));
        assert_eq!(
            service.rename(Uuid::nil(), 1, "x.jpg".to_string()).await.unwrap_err(),
            UploadError::NotFound(Uuid::nil())
        );
    }

    #[tokio::test]
    async fn test_rename_cannot_relabel_content_type() {
        let store = InMemoryFileRecordStore::new();
        let service = UploadService::new(
            UploadPolicy::new(1024, [".jpg", ".png"]),
            Arc::new(store.clone()),
        );
        let record = store
            .create("a.jpg".to_string(), Utc::now(), Bytes::from(jpeg(16)))
            .await
            .unwrap();

        assert!(matches!(
            service.rename(record.id, 1, "a.png".to_string()).await,
            Err(UploadError::ContentMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_oversized_body_is_not_read_to_the_end() {
        const CHUNK: usize = 64 * 1024;
        const TOTAL_CHUNKS: usize = 1025;
        let max_bytes = 1024 * 1024;
        let store = InMemoryFileRecordStore::new();
        let service = UploadService::new(
            UploadPolicy::new(max_bytes, [".jpg"]),
            Arc::new(store.clone()),
        );

        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let body = stream::iter(0..TOTAL_CHUNKS).map(move |i| {
            counter.fetch_add(1, Ordering::SeqCst);
            let chunk = match i {
                0 => {
                    let mut head = format!(
                        "--{}\r\nContent-Disposition: {}\r\n\r\n",
                        BOUNDARY,
                        file_part("huge.jpg")
                    )
                    .into_bytes();
                    head.extend_from_slice(&jpeg(CHUNK));
                    head
                }
                i if i == TOTAL_CHUNKS - 1 => format!("\r\n--{}--\r\n", BOUNDARY).into_bytes(),
                _ => vec![0u8; CHUNK],
            };
            Ok::<_, Infallible>(Bytes::from(chunk))
        });

        let outcome = service.upload(Some(CONTENT_TYPE), body).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::FileTooLarge { max_bytes: m }) if m == max_bytes
        ));
        assert!(store.is_empty().await);

        // Ceiling plus multipart overhead, plus the chunk that crossed it.
        let allowance = (max_bytes + DEFAULT_OVERHEAD_BYTES) / CHUNK + 2;
        assert!(
            pulled.load(Ordering::SeqCst) <= allowance,
            "pulled {} chunks, allowance {}",
            pulled.load(Ordering::SeqCst),
            allowance
        );
    }

    #[tokio::test]
    async fn test_accepts_utf8_file_name() {
        let (service, store) = service_with_store();
        let body = form(&[(file_part("caf\u{e9}.jpg"), jpeg(64))]);

        let record = service
            .upload(Some(CONTENT_TYPE), chunked(body, 512))
            .await
            .into_result()
            .unwrap();
        assert_eq!(record.declared_name, "caf\u{e9}.jpg");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_utf8_named_first_file_still_decides() {
        let (service, store) = service_with_store();
        let body = form(&[
            (file_part("caf\u{e9}.exe"), jpeg(64)),
            (file_part("b.jpg"), jpeg(64)),
        ]);

        let outcome = service.upload(Some(CONTENT_TYPE), chunked(body, 512)).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadError::ExtensionNotAllowed { .. })
        ));
        assert!(store.is_empty().await);
    }
}

