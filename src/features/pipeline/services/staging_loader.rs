use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::{FormatRules, ValidationPolicy};
use crate::core::error::{AppError, Result};
use crate::features::pipeline::format::{self, FileFormat};
use crate::features::uploads::models::FileRecord;
use crate::modules::storage::ObjectStore;

/// Loading stage: materializes the object's rows into `staged_rows` and
/// flips the record to `loaded`, all inside one transaction.
///
/// All or nothing: a failed commit leaves no rows behind, and a retry
/// first clears any rows from a previous attempt, so the invariant
/// "loaded means every row is staged exactly once" holds across crashes.
pub struct StagingLoader {
    pool: PgPool,
    store: Arc<dyn ObjectStore>,
    rules: FormatRules,
    policy: ValidationPolicy,
}

impl StagingLoader {
    pub fn new(
        pool: PgPool,
        store: Arc<dyn ObjectStore>,
        rules: FormatRules,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            pool,
            store,
            rules,
            policy,
        }
    }

    /// Load a validated record. Returns `false` when another worker
    /// committed first; their rows stand and this attempt is discarded.
    pub async fn load(&self, record: &FileRecord) -> Result<bool> {
        let file_format = FileFormat::from_extension(&record.extension)
            .ok_or_else(|| AppError::LoadFailure(format!("Unknown format '{}'", record.extension)))?;

        let bytes = self.store.get(&record.storage_key).await?;

        // Materialization is deterministic, so re-inspecting here yields
        // the same rows the validation stage saw.
        let inspection = format::inspect(file_format, &bytes, &self.rules, &self.policy);
        if !inspection.passed() {
            return Err(AppError::Structural(format!(
                "Object no longer passes validation: {}",
                inspection.errors.join("; ")
            )));
        }

        let mut tx = self.pool.begin().await?;

        // Clear leftovers of a previous attempt that crashed before commit
        sqlx::query("DELETE FROM staged_rows WHERE file_id = $1")
            .bind(record.id)
            .execute(&mut *tx)
            .await?;

        let mut row_number: i64 = 0;
        for payload in &inspection.rows {
            row_number += 1;
            sqlx::query(
                r#"
                INSERT INTO staged_rows (file_id, client_id, row_number, payload)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(record.id)
            .bind(record.client_id)
            .bind(row_number)
            .bind(payload)
            .execute(&mut *tx)
            .await?;
        }

        let updated = sqlx::query(
            r#"
            UPDATE file_records
            SET status = 'loaded', rows_loaded = $2, loaded_at = NOW()
            WHERE id = $1 AND status = 'validated'
            "#,
        )
        .bind(record.id)
        .bind(row_number)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() != 1 {
            tx.rollback().await?;
            tracing::debug!("File {} was loaded by another worker", record.id);
            return Ok(false);
        }

        tx.commit().await?;
        tracing::info!("File {} loaded: {} rows staged", record.id, row_number);
        Ok(true)
    }
}
