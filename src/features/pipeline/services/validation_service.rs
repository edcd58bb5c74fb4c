use std::sync::Arc;

use serde_json::json;

use crate::core::config::{FormatRules, ValidationPolicy};
use crate::core::error::Result;
use crate::features::pipeline::format::{self, FileFormat, Inspection};
use crate::features::uploads::models::{FileRecord, FileStatus};
use crate::features::uploads::services::FileRecordService;
use crate::modules::storage::ObjectStore;

/// Validation stage: claims an uploaded record, inspects the object and
/// closes the record as validated or rejected.
///
/// The claim is a conditional `uploaded -> validating` transition, so two
/// workers handed the same event race harmlessly: exactly one inspects.
pub struct ValidationService {
    records: Arc<FileRecordService>,
    store: Arc<dyn ObjectStore>,
    rules: FormatRules,
    policy: ValidationPolicy,
}

impl ValidationService {
    pub fn new(
        records: Arc<FileRecordService>,
        store: Arc<dyn ObjectStore>,
        rules: FormatRules,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            records,
            store,
            rules,
            policy,
        }
    }

    async fn inspect_object(&self, record: &FileRecord) -> Result<Inspection> {
        let metadata = json!({ "format": record.extension });

        match self.store.size(&record.storage_key).await? {
            None => {
                return Ok(Inspection::failed(
                    "Object is missing from storage".to_string(),
                    metadata,
                ))
            }
            Some(stored) if stored != record.size_bytes => {
                return Ok(Inspection::failed(
                    format!(
                        "Stored object is {} bytes, expected {}",
                        stored, record.size_bytes
                    ),
                    metadata,
                ))
            }
            Some(_) => {}
        }

        let Some(file_format) = FileFormat::from_extension(&record.extension) else {
            return Ok(Inspection::failed(
                format!("Unsupported file format '{}'", record.extension),
                metadata,
            ));
        };

        let bytes = self.store.get(&record.storage_key).await?;
        Ok(format::inspect(
            file_format,
            &bytes,
            &self.rules,
            &self.policy,
        ))
    }

    /// Run validation for one record. Returns `false` when the record was
    /// not in `uploaded` state anymore, in which case nothing was done.
    ///
    /// Storage errors propagate and leave the record in `validating`; the
    /// sweeper rejects it once it exceeds the stuck threshold.
    pub async fn run(&self, record: &FileRecord) -> Result<bool> {
        let claimed = self
            .records
            .try_transition(record.id, FileStatus::Uploaded, FileStatus::Validating)
            .await?;
        if !claimed {
            tracing::debug!("File {} already claimed by another worker", record.id);
            return Ok(false);
        }

        tracing::info!(
            "Validating file {} ({}, {} bytes)",
            record.id,
            record.original_filename,
            record.size_bytes
        );

        let inspection = self.inspect_object(record).await?;
        let outcome = if inspection.passed() {
            FileStatus::Validated
        } else {
            FileStatus::Rejected
        };

        let applied = self
            .records
            .finish_validation(
                record.id,
                outcome,
                &inspection.errors,
                &inspection.warnings,
                &inspection.metadata,
            )
            .await?;

        if applied {
            tracing::info!(
                "File {} {}: {} error(s), {} warning(s)",
                record.id,
                outcome,
                inspection.errors.len(),
                inspection.warnings.len()
            );
        }
        Ok(applied)
    }

    /// Used by the sweeper for records stuck in `validating` past the time
    /// budget, typically after a worker crash mid-inspection.
    pub async fn reject_timed_out(&self, id: uuid::Uuid) -> Result<bool> {
        self.records
            .finish_validation(
                id,
                FileStatus::Rejected,
                &["Validation timed out".to_string()],
                &[],
                &json!({}),
            )
            .await
    }
}
