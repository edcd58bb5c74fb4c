use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::uploads::models::{FileRecord, FileStatus};
use crate::features::uploads::services::FileRecordService;
use crate::modules::storage::{rekey, ObjectStore, StorageNamespace};

/// Routing stage: moves a validated object into the staging namespace or
/// a rejected one into the rejected namespace, then points the record at
/// the new key. Re-running on an already-routed record is a no-op.
pub struct RouterService {
    records: Arc<FileRecordService>,
    store: Arc<dyn ObjectStore>,
}

impl RouterService {
    pub fn new(records: Arc<FileRecordService>, store: Arc<dyn ObjectStore>) -> Self {
        Self { records, store }
    }

    fn target_namespace(status: FileStatus) -> Result<StorageNamespace> {
        match status {
            // Loaded and failed objects stay where the validated route put them
            FileStatus::Validated | FileStatus::Loaded | FileStatus::Failed => {
                Ok(StorageNamespace::Staging)
            }
            FileStatus::Rejected => Ok(StorageNamespace::Rejected),
            FileStatus::Uploaded | FileStatus::Validating => Err(AppError::Internal(format!(
                "File in status '{}' is not routable",
                status
            ))),
        }
    }

    /// Route the object for its current status. Returns the (possibly
    /// unchanged) destination key.
    pub async fn route(&self, record: &FileRecord) -> Result<String> {
        let namespace = Self::target_namespace(record.status)?;

        let dest = rekey(&record.storage_key, namespace).ok_or_else(|| {
            AppError::Storage(format!(
                "Storage key '{}' has no recognizable namespace",
                record.storage_key
            ))
        })?;

        if dest == record.storage_key {
            return Ok(dest);
        }

        self.store.move_to(&record.storage_key, &dest).await?;
        self.records.update_storage_key(record.id, &dest).await?;

        tracing::info!("File {} routed to '{}'", record.id, dest);
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_post_validation_statuses_are_routable() {
        assert!(RouterService::target_namespace(FileStatus::Uploaded).is_err());
        assert!(RouterService::target_namespace(FileStatus::Validating).is_err());
        assert_eq!(
            RouterService::target_namespace(FileStatus::Validated).ok(),
            Some(StorageNamespace::Staging)
        );
        assert_eq!(
            RouterService::target_namespace(FileStatus::Rejected).ok(),
            Some(StorageNamespace::Rejected)
        );
    }
}
