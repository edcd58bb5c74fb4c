use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::clients::services::ClientService;
use crate::features::pipeline::report::ValidationReport;
use crate::features::uploads::models::FileRecord;
use crate::modules::storage::{object_key, ObjectStore, StorageNamespace};

/// Notification stage: persists the validation report as a durable
/// artifact in the reports namespace and emits the outcome log line.
///
/// Best effort. A failed notification never fails the pipeline run; the
/// report is rebuilt from the record on the next delivery of the same
/// event, and the report endpoint serves it on demand regardless.
pub struct Notifier {
    store: Arc<dyn ObjectStore>,
    clients: Arc<ClientService>,
}

impl Notifier {
    pub fn new(store: Arc<dyn ObjectStore>, clients: Arc<ClientService>) -> Self {
        Self { store, clients }
    }

    pub async fn notify(&self, record: &FileRecord) {
        let Some(report) = ValidationReport::from_record(record) else {
            return;
        };

        if let Err(e) = self.persist_report(record, &report).await {
            tracing::warn!(
                "Validation report for file {} not delivered: {}",
                record.id,
                e
            );
        }
    }

    async fn persist_report(&self, record: &FileRecord, report: &ValidationReport) -> Result<()> {
        let client = self
            .clients
            .get_by_id(record.client_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Client {} no longer exists", record.client_id))
            })?;

        let key = object_key(
            StorageNamespace::Reports,
            &client.container_prefix,
            report.validated_at,
            &format!("{}_report.json", record.id),
        );

        let body = serde_json::to_vec_pretty(report)
            .map_err(|e| AppError::Internal(format!("Report serialization failed: {}", e)))?;

        self.store.put(&key, body, "application/json").await?;

        tracing::info!(
            "File {} outcome {} reported for client '{}' at '{}'",
            record.id,
            report.outcome,
            client.client_id,
            key
        );
        Ok(())
    }
}
