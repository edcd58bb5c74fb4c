use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::uploads::models::FileStatus;
use crate::shared::constants::DEFAULT_PAGE_SIZE;

/// Operational counters for the dashboard header.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct DashboardSummaryDto {
    pub total_files: i64,
    pub uploaded_count: i64,
    pub validating_count: i64,
    pub validated_count: i64,
    pub rejected_count: i64,
    pub loaded_count: i64,
    pub failed_count: i64,
    pub total_rows_loaded: i64,
    pub files_today: i64,
    #[sqlx(default)]
    pub active_clients: i64,
}

/// One file record in the cross-client operational view.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct DashboardUploadDto {
    pub id: Uuid,
    /// External client identifier
    pub client_id: String,
    pub client_name: String,
    pub original_filename: String,
    pub extension: String,
    pub size_bytes: i64,
    pub status: FileStatus,
    pub rows_loaded: Option<i64>,
    pub failure_reason: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub loaded_at: Option<DateTime<Utc>>,
    /// Seconds from upload to the last processing milestone reached
    pub processing_duration_secs: Option<f64>,
}

/// Per-status file count for one client.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCountDto {
    pub status: FileStatus,
    pub count: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Query parameters for the dashboard uploads listing.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Number of items per page (default: 10, max: 100)
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,

    /// Restrict the listing to one status
    pub status: Option<FileStatus>,
}

impl DashboardQuery {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, crate::shared::constants::MAX_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_view_carries_processing_milestones() {
        let validated = Utc::now();
        let dto = DashboardUploadDto {
            id: Uuid::new_v4(),
            client_id: "CLI-001".to_string(),
            client_name: "Acme".to_string(),
            original_filename: "data.csv".to_string(),
            extension: "csv".to_string(),
            size_bytes: 42,
            status: FileStatus::Validated,
            rows_loaded: None,
            failure_reason: None,
            uploaded_at: Utc::now(),
            validated_at: Some(validated),
            loaded_at: None,
            processing_duration_secs: Some(1.5),
        };

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(
            json["validated_at"],
            serde_json::to_value(validated).unwrap()
        );
        assert!(json["loaded_at"].is_null());
    }
}
