use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::uploads::models::{FileRecord, FileStatus};

/// Multipart upload form (documentation only; the handler reads the
/// fields directly from the multipart stream).
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// External client identifier, e.g. "CLI-00123"
    pub client_id: String,
    /// Shared secret for the client
    pub access_token: String,
    /// Optional declared size in bytes; must match the body when present
    pub declared_size: Option<i64>,
    /// The file to upload
    #[schema(value_type = String, format = Binary)]
    pub file: String,
}

/// Client-facing view of a file record. Storage keys are internal and
/// never exposed here.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileRecordDto {
    pub id: Uuid,
    pub original_filename: String,
    pub extension: String,
    pub size_bytes: i64,
    pub status: FileStatus,
    pub validation_errors: Vec<String>,
    pub validation_warnings: Vec<String>,
    pub failure_reason: Option<String>,
    pub rows_loaded: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// One staged row of a loaded file.
#[derive(Debug, Serialize, ToSchema)]
pub struct StagedRowDto {
    /// 1-based position in the source file
    pub row_number: i64,
    pub payload: serde_json::Value,
}

impl From<crate::features::uploads::models::StagedRow> for StagedRowDto {
    fn from(row: crate::features::uploads::models::StagedRow) -> Self {
        Self {
            row_number: row.row_number,
            payload: row.payload,
        }
    }
}

fn string_list(value: &Option<serde_json::Value>) -> Vec<String> {
    value
        .as_ref()
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

impl From<FileRecord> for FileRecordDto {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            original_filename: record.original_filename,
            extension: record.extension,
            size_bytes: record.size_bytes,
            status: record.status,
            validation_errors: string_list(&record.validation_errors),
            validation_warnings: string_list(&record.validation_warnings),
            failure_reason: record.failure_reason,
            rows_loaded: record.rows_loaded,
            uploaded_at: record.uploaded_at,
            validated_at: record.validated_at,
            loaded_at: record.loaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_list_tolerates_absent_and_malformed_payloads() {
        assert!(string_list(&None).is_empty());
        assert!(string_list(&Some(serde_json::json!({"not": "a list"}))).is_empty());
        assert_eq!(
            string_list(&Some(serde_json::json!(["a", 1, "b"]))),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
