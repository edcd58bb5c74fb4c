use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::uploads::models::{FileRecord, FileStatus};

/// Durable summary of one validation run.
///
/// The same document is persisted in the reports namespace once a file
/// reaches a terminal status and served from the report endpoint. Built
/// purely from the file record, so it can be regenerated at any time
/// without replaying validation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationReport {
    pub file_id: Uuid,
    pub original_filename: String,
    pub extension: String,
    pub size_bytes: i64,
    pub outcome: FileStatus,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub failure_reason: Option<String>,
    pub row_count: Option<i64>,
    pub metadata: serde_json::Value,
    pub validated_at: DateTime<Utc>,
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

impl ValidationReport {
    /// `None` until the record has passed through validation.
    pub fn from_record(record: &FileRecord) -> Option<Self> {
        let validated_at = record.validated_at?;

        // Loaded rows are authoritative; fall back to the count observed
        // during validation for files that never reached the loader.
        let row_count = record.rows_loaded.or_else(|| {
            record
                .validation_metadata
                .as_ref()
                .and_then(|m| m.get("row_count"))
                .and_then(|v| v.as_i64())
        });

        Some(Self {
            file_id: record.id,
            original_filename: record.original_filename.clone(),
            extension: record.extension.clone(),
            size_bytes: record.size_bytes,
            outcome: record.status,
            valid: !matches!(record.status, FileStatus::Rejected | FileStatus::Failed),
            errors: string_list(&record.validation_errors),
            warnings: string_list(&record.validation_warnings),
            failure_reason: record.failure_reason.clone(),
            row_count,
            metadata: record
                .validation_metadata
                .clone()
                .unwrap_or(serde_json::Value::Null),
            validated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(status: FileStatus, validated: bool) -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            original_filename: "data.csv".to_string(),
            storage_key: "uploads/cli/2026/08/25/abc_data.csv".to_string(),
            extension: "csv".to_string(),
            size_bytes: 42,
            status,
            validation_errors: Some(serde_json::json!(["ragged row at line 3"])),
            validation_warnings: Some(serde_json::json!(["empty row at line 7"])),
            validation_metadata: Some(serde_json::json!({"row_count": 10})),
            failure_reason: None,
            rows_loaded: None,
            uploaded_at: Utc::now(),
            validated_at: validated.then(Utc::now),
            loaded_at: None,
        }
    }

    #[test]
    fn no_report_before_validation_completes() {
        assert!(ValidationReport::from_record(&record(FileStatus::Uploaded, false)).is_none());
        assert!(ValidationReport::from_record(&record(FileStatus::Validating, false)).is_none());
    }

    #[test]
    fn report_carries_errors_warnings_and_metadata() {
        let report = ValidationReport::from_record(&record(FileStatus::Rejected, true))
            .expect("validated record must yield a report");
        assert_eq!(report.outcome, FileStatus::Rejected);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["ragged row at line 3"]);
        assert_eq!(report.warnings, vec!["empty row at line 7"]);
        assert_eq!(report.row_count, Some(10));
        assert_eq!(report.metadata["row_count"], 10);
    }

    #[test]
    fn failed_load_report_names_its_reason() {
        let mut rec = record(FileStatus::Failed, true);
        rec.validation_errors = None;
        rec.validation_warnings = None;
        rec.failure_reason = Some("storage write failed".to_string());
        let report = ValidationReport::from_record(&rec)
            .expect("validated record must yield a report");
        assert!(!report.valid);
        assert_eq!(report.failure_reason.as_deref(), Some("storage write failed"));
    }

    #[test]
    fn loaded_row_count_wins_over_observed_count() {
        let mut rec = record(FileStatus::Loaded, true);
        rec.rows_loaded = Some(9);
        let report = ValidationReport::from_record(&rec)
            .expect("validated record must yield a report");
        assert!(report.valid);
        assert_eq!(report.row_count, Some(9));
    }
}
