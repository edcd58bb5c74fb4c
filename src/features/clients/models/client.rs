use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Registered upload client: identity, credential digest and policy.
///
/// Rows are provisioned administratively; the pipeline treats the registry
/// as read-mostly. `token_hash` holds a SHA-256 hex digest of the shared
/// secret; the plaintext is never stored.
#[derive(Debug, Clone, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub client_id: String,
    pub client_name: String,
    pub token_hash: String,
    pub container_prefix: String,
    pub is_active: bool,
    pub max_file_size_bytes: i64,
    pub allowed_extensions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}
