use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::clients::models::Client;
use crate::features::uploads::models::{FileRecord, FileStatus, StagedRow};
use crate::shared::types::PaginationQuery;

const RECORD_COLUMNS: &str = r#"
    id, client_id, original_filename, storage_key, extension, size_bytes,
    status, validation_errors, validation_warnings, validation_metadata,
    failure_reason, rows_loaded, uploaded_at, validated_at, loaded_at
"#;

/// Service for file record operations.
///
/// All status writes are conditional on the expected current status
/// (optimistic single-writer per record): a concurrent writer that lost the
/// race sees `false` and treats its own invocation as a no-op. This is what
/// makes at-least-once event delivery safe.
pub struct FileRecordService {
    pool: PgPool,
}

impl FileRecordService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a record for a freshly persisted object, always `Uploaded`.
    pub async fn create(
        &self,
        client: &Client,
        original_filename: &str,
        storage_key: &str,
        extension: &str,
        size_bytes: i64,
    ) -> Result<FileRecord> {
        let record = sqlx::query_as::<_, FileRecord>(&format!(
            r#"
            INSERT INTO file_records
                (client_id, original_filename, storage_key, extension, size_bytes, status)
            VALUES ($1, $2, $3, $4, $5, 'uploaded')
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(client.id)
        .bind(original_filename)
        .bind(storage_key)
        .bind(extension)
        .bind(size_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create file record: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "File record created: {} ({}, {} bytes) for client {}",
            record.id,
            record.original_filename,
            record.size_bytes,
            client.client_id
        );
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM file_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Fetch a record only if it belongs to the given client. The isolation
    /// mirror of storage-namespace segregation: a client can never address
    /// another client's records.
    pub async fn get_for_client(&self, id: Uuid, client_id: Uuid) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM file_records WHERE id = $1 AND client_id = $2"
        ))
        .bind(id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_for_client(
        &self,
        client_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<FileRecord>, i64)> {
        let records = sqlx::query_as::<_, FileRecord>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM file_records
            WHERE client_id = $1
            ORDER BY uploaded_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(client_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM file_records WHERE client_id = $1",
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((records, total))
    }

    /// Attempt the conditional transition `from -> to`. Returns whether this
    /// caller won; `false` means another writer already moved the record.
    /// Transitions outside the closed graph are rejected at this boundary.
    pub async fn try_transition(&self, id: Uuid, from: FileStatus, to: FileStatus) -> Result<bool> {
        if !from.can_transition(to) {
            return Err(AppError::Validation(format!(
                "Invalid status transition {} -> {}",
                from, to
            )));
        }

        let result = sqlx::query("UPDATE file_records SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from)
            .bind(to)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Close out a validation run: `Validating -> Validated | Rejected`,
    /// stamping `validated_at` regardless of outcome and persisting the
    /// diagnostic payload. Conditional like every other transition.
    pub async fn finish_validation(
        &self,
        id: Uuid,
        outcome: FileStatus,
        errors: &[String],
        warnings: &[String],
        metadata: &serde_json::Value,
    ) -> Result<bool> {
        if !FileStatus::Validating.can_transition(outcome) {
            return Err(AppError::Validation(format!(
                "Invalid validation outcome: {}",
                outcome
            )));
        }

        let result = sqlx::query(
            r#"
            UPDATE file_records
            SET status = $2,
                validation_errors = $3,
                validation_warnings = $4,
                validation_metadata = $5,
                validated_at = NOW()
            WHERE id = $1 AND status = 'validating'
            "#,
        )
        .bind(id)
        .bind(outcome)
        .bind(serde_json::json!(errors))
        .bind(serde_json::json!(warnings))
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Record a staging failure: `Validated -> Failed` with the reason.
    pub async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE file_records
            SET status = 'failed', failure_reason = $2
            WHERE id = $1 AND status = 'validated'
            "#,
        )
        .bind(id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            tracing::warn!("File record {} marked failed: {}", id, reason);
        }
        Ok(result.rows_affected() == 1)
    }

    /// Point the record at the object's new location after a routing move.
    pub async fn update_storage_key(&self, id: Uuid, storage_key: &str) -> Result<()> {
        sqlx::query("UPDATE file_records SET storage_key = $2 WHERE id = $1")
            .bind(id)
            .bind(storage_key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Non-terminal records older than the threshold. These are either
    /// events lost in flight (`uploaded`, `validated`) or leftovers of a
    /// crashed validation run (`validating`); the sweeper reprocesses them.
    pub async fn find_stuck(&self, older_than: Duration, limit: i64) -> Result<Vec<FileRecord>> {
        let cutoff: DateTime<Utc> = Utc::now() - older_than;

        let records = sqlx::query_as::<_, FileRecord>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM file_records
            WHERE status IN ('uploaded', 'validating', 'validated')
              AND COALESCE(validated_at, uploaded_at) < $1
            ORDER BY uploaded_at ASC
            LIMIT $2
            "#
        ))
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Page through the staged rows of a loaded file, in row order.
    pub async fn staged_rows(
        &self,
        file_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<Vec<StagedRow>> {
        let rows = sqlx::query_as::<_, StagedRow>(
            r#"
            SELECT id, file_id, client_id, row_number, payload, created_at
            FROM staged_rows
            WHERE file_id = $1
            ORDER BY row_number ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(file_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Count of staged rows for a file.
    pub async fn staged_row_count(&self, file_id: Uuid) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM staged_rows WHERE file_id = $1")
                .bind(file_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
