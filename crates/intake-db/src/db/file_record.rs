//! File record repository: CRUD for the application_files table.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use intake_core::{FileRecordSummary, RecordUpdate, UploadError, UploadedFileRecord};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::store::FileRecordStore;

/// Row type for application_files table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct FileRecordRow {
    pub id: Uuid,
    pub declared_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub size: i64,
    pub content: Vec<u8>,
    pub version: i32,
}

impl FileRecordRow {
    pub fn to_record(self) -> UploadedFileRecord {
        UploadedFileRecord {
            id: self.id,
            declared_name: self.declared_name,
            timestamp: self.uploaded_at,
            size: self.size,
            content: Bytes::from(self.content),
            version: self.version,
        }
    }
}

/// Metadata-only row; never pulls `content` off the wire.
#[derive(Debug, sqlx::FromRow)]
pub struct FileRecordSummaryRow {
    pub id: Uuid,
    pub declared_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub size: i64,
    pub version: i32,
}

impl FileRecordSummaryRow {
    pub fn to_summary(self) -> FileRecordSummary {
        FileRecordSummary {
            id: self.id,
            declared_name: self.declared_name,
            timestamp: self.uploaded_at,
            size: self.size,
            version: self.version,
        }
    }
}

/// Repository for application_files table.
#[derive(Clone)]
pub struct FileRecordRepository {
    pool: PgPool,
}

impl FileRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, id: Uuid) -> Result<Option<i32>, UploadError> {
        let version: Option<i32> =
            sqlx::query_scalar::<Postgres, i32>("SELECT version FROM application_files WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(version)
    }
}

#[async_trait]
impl FileRecordStore for FileRecordRepository {
    #[tracing::instrument(skip(self, declared_name, content), fields(db.table = "application_files", size = content.len()))]
    async fn create(
        &self,
        declared_name: String,
        timestamp: DateTime<Utc>,
        content: Bytes,
    ) -> Result<UploadedFileRecord, UploadError> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        let row: FileRecordRow = sqlx::query_as::<Postgres, FileRecordRow>(
            r#"
            INSERT INTO application_files (id, declared_name, uploaded_at, size, content, version)
            VALUES ($1, $2, $3, $4, $5, 1)
            RETURNING id, declared_name, uploaded_at, size, content, version
            "#,
        )
        .bind(id)
        .bind(&declared_name)
        .bind(timestamp)
        .bind(content.len() as i64)
        .bind(&content[..])
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.to_record())
    }

    #[tracing::instrument(skip(self), fields(db.table = "application_files", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<UploadedFileRecord>, UploadError> {
        let row: Option<FileRecordRow> = sqlx::query_as::<Postgres, FileRecordRow>(
            r#"
            SELECT id, declared_name, uploaded_at, size, content, version
            FROM application_files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.to_record()))
    }

    #[tracing::instrument(skip(self), fields(db.table = "application_files"))]
    async fn list(&self) -> Result<Vec<FileRecordSummary>, UploadError> {
        let rows: Vec<FileRecordSummaryRow> = sqlx::query_as::<Postgres, FileRecordSummaryRow>(
            r#"
            SELECT id, declared_name, uploaded_at, size, version
            FROM application_files
            ORDER BY uploaded_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.to_summary()).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "application_files", db.record_id = %id))]
    async fn delete(&self, id: Uuid, expected_version: Option<i32>) -> Result<(), UploadError> {
        let result = sqlx::query(
            r#"
            DELETE FROM application_files
            WHERE id = $1 AND ($2::INTEGER IS NULL OR version = $2)
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match expected_version {
            Some(expected) if self.current_version(id).await?.is_some() => {
                Err(UploadError::Conflict { id, expected })
            }
            _ => Ok(()),
        }
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "application_files", db.record_id = %id))]
    async fn update(
        &self,
        id: Uuid,
        expected_version: i32,
        update: RecordUpdate,
    ) -> Result<UploadedFileRecord, UploadError> {
        let row: Option<FileRecordRow> = sqlx::query_as::<Postgres, FileRecordRow>(
            r#"
            UPDATE application_files
            SET declared_name = COALESCE($3::TEXT, declared_name),
                content = COALESCE($4::BYTEA, content),
                size = COALESCE(octet_length($4::BYTEA)::BIGINT, size),
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING id, declared_name, uploaded_at, size, content, version
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(update.declared_name.as_deref())
        .bind(update.content.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row.to_record());
        }

        match self.current_version(id).await? {
            Some(current) => {
                tracing::debug!(
                    expected_version,
                    current_version = current,
                    "Rejected stale update"
                );
                Err(UploadError::Conflict {
                    id,
                    expected: expected_version,
                })
            }
            None => Err(UploadError::NotFound(id)),
        }
    }

    async fn health_check(&self) -> Result<(), UploadError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
