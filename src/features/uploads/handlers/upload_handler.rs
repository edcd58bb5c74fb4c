use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::clients::models::Client;
use crate::features::clients::services::ClientService;
use crate::features::pipeline::report::ValidationReport;
use crate::features::uploads::dtos::{FileRecordDto, StagedRowDto, UploadFileDto};
use crate::features::uploads::services::{FileRecordService, IntakeService};
use crate::shared::constants::{ACCESS_TOKEN_HEADER, CLIENT_ID_HEADER};
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Shared state for the uploads feature routes.
#[derive(Clone)]
pub struct UploadState {
    pub intake: Arc<IntakeService>,
    pub records: Arc<FileRecordService>,
    pub clients: Arc<ClientService>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Authenticate the query endpoints from the credential headers. Same
/// verifier as the upload form, so policy (including is_active) applies
/// uniformly.
async fn authenticate(state: &UploadState, headers: &HeaderMap) -> Result<Client, AppError> {
    let client_id = header_value(headers, CLIENT_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing client credentials".to_string()))?;
    let access_token = header_value(headers, ACCESS_TOKEN_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing client credentials".to_string()))?;

    state.clients.verify(&client_id, &access_token).await
}

/// Upload a file
///
/// Accepts multipart/form-data with:
/// - `client_id`: external client identifier (required)
/// - `access_token`: client secret (required)
/// - `declared_size`: declared byte size, checked against the body (optional)
/// - `file`: the file to upload (required)
#[utoipa::path(
    post,
    path = "/api/uploads",
    tag = "Uploads",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "Upload form with client credentials and the file",
    ),
    responses(
        (status = 201, description = "File accepted for processing", body = ApiResponse<FileRecordDto>),
        (status = 400, description = "Malformed upload form"),
        (status = 401, description = "Invalid client credentials"),
        (status = 422, description = "Upload violates the client's intake policy")
    )
)]
pub async fn upload_file(
    State(state): State<UploadState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileRecordDto>>), AppError> {
    let mut client_id: Option<String> = None;
    let mut access_token: Option<String> = None;
    let mut declared_size: Option<i64> = None;
    let mut file_name: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let fname = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                file_name = Some(fname);
                file_data = Some(data.to_vec());
            }
            "client_id" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read client_id field: {}", e))
                })?;
                client_id = Some(text);
            }
            "access_token" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read access_token field: {}", e))
                })?;
                access_token = Some(text);
            }
            "declared_size" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read declared_size field: {}", e))
                })?;
                let size = text.trim().parse::<i64>().map_err(|_| {
                    AppError::BadRequest("declared_size must be an integer".to_string())
                })?;
                declared_size = Some(size);
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let client_id =
        client_id.ok_or_else(|| AppError::BadRequest("client_id is required".to_string()))?;
    let access_token =
        access_token.ok_or_else(|| AppError::BadRequest("access_token is required".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;
    let file_data =
        file_data.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    let record = state
        .intake
        .accept(
            &client_id,
            &access_token,
            &file_name,
            declared_size,
            file_data,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(FileRecordDto::from(record)),
            Some("File accepted for processing".to_string()),
            None,
        )),
    ))
}

/// List the calling client's file records, newest first
#[utoipa::path(
    get,
    path = "/api/uploads",
    tag = "Uploads",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Paginated file records", body = ApiResponse<Vec<FileRecordDto>>),
        (status = 401, description = "Invalid client credentials")
    ),
    security(("client_headers" = []))
)]
pub async fn list_files(
    State(state): State<UploadState>,
    headers: HeaderMap,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<FileRecordDto>>>, AppError> {
    let client = authenticate(&state, &headers).await?;

    let (records, total) = state.records.list_for_client(client.id, &pagination).await?;
    let items = records.into_iter().map(FileRecordDto::from).collect();

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

/// Get one of the calling client's file records
#[utoipa::path(
    get,
    path = "/api/uploads/{id}",
    tag = "Uploads",
    params(("id" = Uuid, Path, description = "File record ID")),
    responses(
        (status = 200, description = "File record", body = ApiResponse<FileRecordDto>),
        (status = 401, description = "Invalid client credentials"),
        (status = 404, description = "File record not found")
    ),
    security(("client_headers" = []))
)]
pub async fn get_file(
    State(state): State<UploadState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileRecordDto>>, AppError> {
    let client = authenticate(&state, &headers).await?;

    let record = state
        .records
        .get_for_client(id, client.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File record '{}' not found", id)))?;

    Ok(Json(ApiResponse::success(
        Some(FileRecordDto::from(record)),
        None,
        None,
    )))
}

/// Page through the staged rows of one of the calling client's loaded files
#[utoipa::path(
    get,
    path = "/api/uploads/{id}/rows",
    tag = "Uploads",
    params(
        ("id" = Uuid, Path, description = "File record ID"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Staged rows in row order", body = ApiResponse<Vec<StagedRowDto>>),
        (status = 401, description = "Invalid client credentials"),
        (status = 404, description = "File record not found")
    ),
    security(("client_headers" = []))
)]
pub async fn get_rows(
    State(state): State<UploadState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<StagedRowDto>>>, AppError> {
    let client = authenticate(&state, &headers).await?;

    // Scope check before touching staged_rows
    state
        .records
        .get_for_client(id, client.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File record '{}' not found", id)))?;

    let rows = state.records.staged_rows(id, &pagination).await?;
    let total = state.records.staged_row_count(id).await?;
    let items = rows.into_iter().map(StagedRowDto::from).collect();

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

/// Get the validation report for one of the calling client's files
#[utoipa::path(
    get,
    path = "/api/uploads/{id}/report",
    tag = "Uploads",
    params(("id" = Uuid, Path, description = "File record ID")),
    responses(
        (status = 200, description = "Validation report", body = ApiResponse<ValidationReport>),
        (status = 401, description = "Invalid client credentials"),
        (status = 404, description = "File record not found or not yet validated")
    ),
    security(("client_headers" = []))
)]
pub async fn get_report(
    State(state): State<UploadState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ValidationReport>>, AppError> {
    let client = authenticate(&state, &headers).await?;

    let record = state
        .records
        .get_for_client(id, client.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File record '{}' not found", id)))?;

    let report = ValidationReport::from_record(&record).ok_or_else(|| {
        AppError::NotFound(format!("File record '{}' has not been validated yet", id))
    })?;

    Ok(Json(ApiResponse::success(Some(report), None, None)))
}
