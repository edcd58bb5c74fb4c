use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::clients::models::Client;
use crate::shared::validation::CLIENT_ID_REGEX;

/// Credential handshake request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthRequestDto {
    /// External client identifier, e.g. "CLI-00123"
    #[validate(regex(path = *CLIENT_ID_REGEX, message = "Invalid client_id format"))]
    pub client_id: String,

    /// Shared secret for the client
    #[validate(length(min = 1, message = "access_token is required"))]
    pub access_token: String,
}

/// Operator request to enable or disable a client.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateClientActiveDto {
    pub is_active: bool,
}

/// Operator request to change a client's intake policy.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateClientPolicyDto {
    #[validate(range(min = 1, message = "max_file_size_bytes must be positive"))]
    pub max_file_size_bytes: i64,

    #[validate(length(min = 1, message = "allowed_extensions must not be empty"))]
    pub allowed_extensions: Vec<String>,
}

/// What a client learns about itself on a successful handshake: identity
/// plus the intake policy its uploads will be held to. Never the digest.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClientProfileDto {
    pub client_id: String,
    pub client_name: String,
    pub max_file_size_bytes: i64,
    pub allowed_extensions: Vec<String>,
}

impl From<Client> for ClientProfileDto {
    fn from(client: Client) -> Self {
        Self {
            client_id: client.client_id,
            client_name: client.client_name,
            max_file_size_bytes: client.max_file_size_bytes,
            allowed_extensions: client.allowed_extensions,
        }
    }
}
