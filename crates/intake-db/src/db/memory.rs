//! In-memory file record store
//!
//! Same semantics as the Postgres repository, held in a map behind an async
//! lock. Every mutation happens under a single write guard, so records are
//! always observed whole. Contents are lost when the process exits.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use intake_core::{FileRecordSummary, RecordUpdate, UploadError, UploadedFileRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::FileRecordStore;

#[derive(Clone, Default)]
pub struct InMemoryFileRecordStore {
    records: Arc<RwLock<HashMap<Uuid, UploadedFileRecord>>>,
}

impl InMemoryFileRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl FileRecordStore for InMemoryFileRecordStore {
    async fn create(
        &self,
        declared_name: String,
        timestamp: DateTime<Utc>,
        content: Bytes,
    ) -> Result<UploadedFileRecord, UploadError> {
        let mut records = self.records.write().await;
        let mut id = Uuid::new_v4();
        while records.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let record = UploadedFileRecord::new(id, declared_name, timestamp, content);
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<UploadedFileRecord>, UploadError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<FileRecordSummary>, UploadError> {
        let records = self.records.read().await;
        let mut summaries: Vec<FileRecordSummary> =
            records.values().map(UploadedFileRecord::summary).collect();
        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    async fn delete(&self, id: Uuid, expected_version: Option<i32>) -> Result<(), UploadError> {
        let mut records = self.records.write().await;
        match (records.get(&id), expected_version) {
            (None, _) => Ok(()),
            (Some(record), Some(expected)) if record.version != expected => {
                Err(UploadError::Conflict { id, expected })
            }
            (Some(_), _) => {
                records.remove(&id);
                Ok(())
            }
        }
    }

    async fn update(
        &self,
        id: Uuid,
        expected_version: i32,
        update: RecordUpdate,
    ) -> Result<UploadedFileRecord, UploadError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(UploadError::NotFound(id))?;
        if record.version != expected_version {
            return Err(UploadError::Conflict {
                id,
                expected: expected_version,
            });
        }

        if let Some(declared_name) = update.declared_name {
            record.declared_name = declared_name;
        }
        if let Some(content) = update.content {
            record.size = content.len() as i64;
            record.content = content;
        }
        record.version += 1;

        Ok(record.clone())
    }

    async fn health_check(&self) -> Result<(), UploadError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
