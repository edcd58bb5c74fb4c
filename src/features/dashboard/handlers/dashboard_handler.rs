use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::AppError;
use crate::features::dashboard::dtos::{
    DashboardQuery, DashboardSummaryDto, DashboardUploadDto, StatusCountDto,
};
use crate::features::dashboard::services::DashboardService;
use crate::shared::types::{ApiResponse, Meta};

/// Get operational summary counters
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = ApiResponse<DashboardSummaryDto>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_summary(
    State(service): State<Arc<DashboardService>>,
) -> Result<Json<ApiResponse<DashboardSummaryDto>>, AppError> {
    let summary = service.get_summary().await?;
    Ok(Json(ApiResponse::success(Some(summary), None, None)))
}

/// List uploads across all clients
#[utoipa::path(
    get,
    path = "/api/dashboard/uploads",
    tag = "Dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Paginated cross-client uploads", body = ApiResponse<Vec<DashboardUploadDto>>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_uploads(
    State(service): State<Arc<DashboardService>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<Vec<DashboardUploadDto>>>, AppError> {
    let (uploads, total) = service.list_uploads(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(uploads),
        None,
        Some(Meta { total }),
    )))
}

/// Per-status file counts for one client
#[utoipa::path(
    get,
    path = "/api/dashboard/clients/{client_id}",
    tag = "Dashboard",
    params(("client_id" = String, Path, description = "External client identifier")),
    responses(
        (status = 200, description = "Status counts for the client", body = ApiResponse<Vec<StatusCountDto>>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_client_counts(
    State(service): State<Arc<DashboardService>>,
    Path(client_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<StatusCountDto>>>, AppError> {
    let counts = service
        .client_status_counts(&client_id)
        .await?
        .into_iter()
        .map(|(status, count)| StatusCountDto { status, count })
        .collect();

    Ok(Json(ApiResponse::success(Some(counts), None, None)))
}
