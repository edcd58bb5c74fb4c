use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::clients::dtos::{
    AuthRequestDto, ClientProfileDto, UpdateClientActiveDto, UpdateClientPolicyDto,
};
use crate::features::clients::services::ClientService;
use crate::shared::types::ApiResponse;

/// Credential handshake
///
/// Verifies a client_id and access_token pair without uploading anything.
/// On success returns the client's profile and intake policy.
#[utoipa::path(
    post,
    path = "/api/auth",
    tag = "Auth",
    request_body = AuthRequestDto,
    responses(
        (status = 200, description = "Credentials are valid", body = ApiResponse<ClientProfileDto>),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Invalid client credentials")
    )
)]
pub async fn authenticate_client(
    State(service): State<Arc<ClientService>>,
    Json(payload): Json<AuthRequestDto>,
) -> Result<Json<ApiResponse<ClientProfileDto>>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let client = service
        .verify(&payload.client_id, &payload.access_token)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(ClientProfileDto::from(client)),
        Some("Credentials verified".to_string()),
        None,
    )))
}

/// Enable or disable a client (operator only)
#[utoipa::path(
    patch,
    path = "/api/clients/{client_id}/active",
    tag = "Clients",
    params(("client_id" = String, Path, description = "External client identifier")),
    request_body = UpdateClientActiveDto,
    responses(
        (status = 200, description = "Client updated", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Operator credentials required"),
        (status = 404, description = "Client not found")
    ),
    security(("operator_basic" = []))
)]
pub async fn set_client_active(
    State(service): State<Arc<ClientService>>,
    Path(client_id): Path<String>,
    Json(payload): Json<UpdateClientActiveDto>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    service.set_active(&client_id, payload.is_active).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some(format!(
            "Client '{}' is now {}",
            client_id,
            if payload.is_active { "active" } else { "inactive" }
        )),
        None,
    )))
}

/// Update a client's intake policy (operator only)
#[utoipa::path(
    patch,
    path = "/api/clients/{client_id}/policy",
    tag = "Clients",
    params(("client_id" = String, Path, description = "External client identifier")),
    request_body = UpdateClientPolicyDto,
    responses(
        (status = 200, description = "Policy updated", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid policy"),
        (status = 401, description = "Operator credentials required"),
        (status = 404, description = "Client not found")
    ),
    security(("operator_basic" = []))
)]
pub async fn update_client_policy(
    State(service): State<Arc<ClientService>>,
    Path(client_id): Path<String>,
    Json(payload): Json<UpdateClientPolicyDto>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service
        .update_policy(
            &client_id,
            payload.max_file_size_bytes,
            &payload.allowed_extensions,
        )
        .await?;

    Ok(Json(ApiResponse::success(
        None,
        Some(format!("Client '{}' policy updated", client_id)),
        None,
    )))
}
