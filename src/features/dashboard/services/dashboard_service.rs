use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::dashboard::dtos::{DashboardQuery, DashboardSummaryDto, DashboardUploadDto};
use crate::features::uploads::models::FileStatus;

/// Read-only cross-client projection over the file record ledger, for the
/// operational dashboard. Never writes.
pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Counters for the dashboard header.
    pub async fn get_summary(&self) -> Result<DashboardSummaryDto> {
        let mut summary = sqlx::query_as::<_, DashboardSummaryDto>(
            r#"
            SELECT
                COUNT(*) AS total_files,
                COUNT(*) FILTER (WHERE status = 'uploaded') AS uploaded_count,
                COUNT(*) FILTER (WHERE status = 'validating') AS validating_count,
                COUNT(*) FILTER (WHERE status = 'validated') AS validated_count,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected_count,
                COUNT(*) FILTER (WHERE status = 'loaded') AS loaded_count,
                COUNT(*) FILTER (WHERE status = 'failed') AS failed_count,
                COALESCE(SUM(rows_loaded), 0)::BIGINT AS total_rows_loaded,
                COUNT(*) FILTER (WHERE uploaded_at >= date_trunc('day', NOW())) AS files_today
            FROM file_records
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get summary counts: {:?}", e);
            AppError::Database(e)
        })?;

        summary.active_clients =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients WHERE is_active")
                .fetch_one(&self.pool)
                .await?;

        Ok(summary)
    }

    /// List file records across all clients, newest first, optionally
    /// filtered by status. Returns (uploads, total_count).
    pub async fn list_uploads(
        &self,
        query: &DashboardQuery,
    ) -> Result<(Vec<DashboardUploadDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM file_records
            WHERE ($1::file_status IS NULL OR status = $1)
            "#,
        )
        .bind(query.status)
        .fetch_one(&self.pool)
        .await?;

        let uploads = sqlx::query_as::<_, DashboardUploadDto>(
            r#"
            SELECT
                f.id,
                c.client_id,
                c.client_name,
                f.original_filename,
                f.extension,
                f.size_bytes,
                f.status,
                f.rows_loaded,
                f.failure_reason,
                f.uploaded_at,
                f.validated_at,
                f.loaded_at,
                EXTRACT(EPOCH FROM (
                    COALESCE(f.loaded_at, f.validated_at) - f.uploaded_at
                ))::DOUBLE PRECISION AS processing_duration_secs
            FROM file_records f
            JOIN clients c ON c.id = f.client_id
            WHERE ($1::file_status IS NULL OR f.status = $1)
            ORDER BY f.uploaded_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(query.status)
        .bind(query.offset())
        .bind(query.limit())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch dashboard uploads: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((uploads, total))
    }

    /// Per-status count for one client, used by the client detail view.
    pub async fn client_status_counts(
        &self,
        external_client_id: &str,
    ) -> Result<Vec<(FileStatus, i64)>> {
        let rows = sqlx::query_as::<_, (FileStatus, i64)>(
            r#"
            SELECT f.status, COUNT(*)
            FROM file_records f
            JOIN clients c ON c.id = f.client_id
            WHERE c.client_id = $1
            GROUP BY f.status
            "#,
        )
        .bind(external_client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
