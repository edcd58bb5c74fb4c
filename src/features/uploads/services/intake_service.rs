use std::sync::Arc;

use chrono::Utc;

use crate::core::error::{AppError, Result};
use crate::features::clients::models::Client;
use crate::features::clients::services::ClientService;
use crate::features::pipeline::events::PipelineHandle;
use crate::features::uploads::models::FileRecord;
use crate::features::uploads::services::FileRecordService;
use crate::modules::storage::{object_key, ObjectStore, StorageNamespace};
use crate::shared::validation::{file_extension, sanitize_filename};

/// Formats the pipeline can parse. A client policy may further restrict
/// this set but never widen it.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["csv", "json", "txt"];

/// Object name for an upload: a short random prefix plus the sanitized
/// original name, so two uploads of the same file never collide.
fn object_name(original_filename: &str) -> String {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", &tag[..8], sanitize_filename(original_filename))
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "csv" => "text/csv",
        "json" => "application/json",
        _ => "text/plain",
    }
}

/// Front door of the pipeline: verifies credentials, enforces intake
/// policy, persists the object, creates the ledger record and wakes the
/// worker. Policy violations are rejected before any byte is stored.
pub struct IntakeService {
    clients: Arc<ClientService>,
    records: Arc<FileRecordService>,
    store: Arc<dyn ObjectStore>,
    pipeline: PipelineHandle,
}

impl IntakeService {
    pub fn new(
        clients: Arc<ClientService>,
        records: Arc<FileRecordService>,
        store: Arc<dyn ObjectStore>,
        pipeline: PipelineHandle,
    ) -> Self {
        Self {
            clients,
            records,
            store,
            pipeline,
        }
    }

    /// Intake policy checks against the client's registered limits.
    /// Returns the validated extension.
    fn check_policy(
        client: &Client,
        filename: &str,
        size_bytes: i64,
        declared_size: Option<i64>,
    ) -> Result<String> {
        if filename.trim().is_empty() {
            return Err(AppError::BadRequest("Filename is required".to_string()));
        }

        let extension = file_extension(filename).ok_or_else(|| {
            AppError::PolicyViolation(format!("File '{}' has no extension", filename))
        })?;

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::PolicyViolation(format!(
                "Unsupported file format '{}'; supported: {}",
                extension,
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        if !client.allows_extension(&extension) {
            return Err(AppError::PolicyViolation(format!(
                "Extension '{}' is not allowed for client {}",
                extension, client.client_id
            )));
        }

        if size_bytes == 0 {
            return Err(AppError::PolicyViolation("File is empty".to_string()));
        }

        if size_bytes > client.max_file_size_bytes {
            return Err(AppError::PolicyViolation(format!(
                "File size {} exceeds the limit of {} bytes",
                size_bytes, client.max_file_size_bytes
            )));
        }

        // A declared size is advisory; when present it must match the body.
        if let Some(declared) = declared_size {
            if declared != size_bytes {
                return Err(AppError::PolicyViolation(format!(
                    "Declared size {} does not match received size {}",
                    declared, size_bytes
                )));
            }
        }

        Ok(extension)
    }

    /// Accept one upload end to end.
    ///
    /// Ordering matters: the object is written before the record so a
    /// record never points at a missing object. If the record insert fails
    /// the object is deleted again, best effort.
    pub async fn accept(
        &self,
        client_id: &str,
        access_token: &str,
        filename: &str,
        declared_size: Option<i64>,
        content: Vec<u8>,
    ) -> Result<FileRecord> {
        let client = self.clients.verify(client_id, access_token).await?;

        let size_bytes = content.len() as i64;
        let extension = Self::check_policy(&client, filename, size_bytes, declared_size)?;

        let key = object_key(
            StorageNamespace::Uploads,
            &client.container_prefix,
            Utc::now(),
            &object_name(filename),
        );

        self.store
            .put(&key, content, content_type_for(&extension))
            .await?;

        let record = match self
            .records
            .create(&client, filename, &key, &extension, size_bytes)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                if let Err(del) = self.store.delete(&key).await {
                    tracing::error!("Orphaned object '{}' could not be deleted: {}", key, del);
                }
                return Err(e);
            }
        };

        self.pipeline.publish(record.id);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::clients::services::hash_token;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_client() -> Client {
        Client {
            id: Uuid::new_v4(),
            client_id: "CLI-00123".to_string(),
            client_name: "Test Client".to_string(),
            token_hash: hash_token("s"),
            container_prefix: "cli-00123".to_string(),
            is_active: true,
            max_file_size_bytes: 1024,
            allowed_extensions: vec!["csv".to_string(), "txt".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn policy_accepts_a_conforming_file() {
        let ext = IntakeService::check_policy(&test_client(), "data.csv", 100, None);
        assert_eq!(ext.ok().as_deref(), Some("csv"));
    }

    #[test]
    fn policy_rejects_unsupported_format() {
        let err = IntakeService::check_policy(&test_client(), "data.parquet", 100, None);
        assert!(matches!(err, Err(AppError::PolicyViolation(_))));
    }

    #[test]
    fn policy_rejects_extension_outside_client_allowlist() {
        // json is supported by the pipeline but not allowed for this client
        let err = IntakeService::check_policy(&test_client(), "data.json", 100, None);
        assert!(matches!(err, Err(AppError::PolicyViolation(_))));
    }

    #[test]
    fn policy_rejects_oversize_and_empty_files() {
        let client = test_client();
        assert!(IntakeService::check_policy(&client, "data.csv", 2048, None).is_err());
        assert!(IntakeService::check_policy(&client, "data.csv", 0, None).is_err());
    }

    #[test]
    fn policy_rejects_declared_size_mismatch() {
        let err = IntakeService::check_policy(&test_client(), "data.csv", 100, Some(99));
        assert!(matches!(err, Err(AppError::PolicyViolation(_))));
        assert!(IntakeService::check_policy(&test_client(), "data.csv", 100, Some(100)).is_ok());
    }

    #[test]
    fn object_names_are_unique_per_upload() {
        let a = object_name("my report.csv");
        let b = object_name("my report.csv");
        assert_ne!(a, b);
        assert!(a.ends_with("_my_report.csv"));
        assert_eq!(a.split('_').next().map(str::len), Some(8));
    }
}
