use sha2::{Digest, Sha256};
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::clients::models::Client;

/// SHA-256 digest of a dummy secret, compared against when the client is
/// unknown so the unknown-client path costs the same as a hash mismatch.
const DUMMY_TOKEN_HASH: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Hash a client secret the same way the provisioning process does.
pub fn hash_token(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Whether the presented digest authorizes this client. Inactive clients
/// never match, regardless of secret correctness.
fn credentials_match(client: &Client, presented_hash: &str) -> bool {
    let hash_ok = secure_compare(presented_hash, &client.token_hash);
    client.is_active && hash_ok
}

fn unauthorized() -> AppError {
    // One message for unknown client, inactive client and bad secret:
    // the caller must not be able to enumerate registered clients.
    AppError::Unauthorized("Invalid client credentials".to_string())
}

/// Client registry and credential verifier.
pub struct ClientService {
    pool: PgPool,
}

impl ClientService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_client_id(&self, client_id: &str) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, client_id, client_name, token_hash, container_prefix,
                   is_active, max_file_size_bytes, allowed_extensions,
                   created_at, updated_at
            FROM clients
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch client '{}': {:?}", client_id, e);
            AppError::Database(e)
        })?;

        Ok(client)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, client_id, client_name, token_hash, container_prefix,
                   is_active, max_file_size_bytes, allowed_extensions,
                   created_at, updated_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Verify a client credential pair. No side effects.
    ///
    /// Returns the client (with its policy) on success. Unknown client,
    /// inactive client and hash mismatch all return the same
    /// `Unauthorized` error, and all three paths perform a digest
    /// comparison so response timing does not leak which case occurred.
    pub async fn verify(&self, client_id: &str, secret: &str) -> Result<Client> {
        let presented = hash_token(secret);

        match self.get_by_client_id(client_id).await? {
            Some(client) if credentials_match(&client, &presented) => Ok(client),
            Some(_) => Err(unauthorized()),
            None => {
                let _ = secure_compare(&presented, DUMMY_TOKEN_HASH);
                Err(unauthorized())
            }
        }
    }

    /// Administrative toggle; takes effect for the pipeline on the next read.
    pub async fn set_active(&self, client_id: &str, is_active: bool) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET is_active = $2, updated_at = NOW()
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .bind(is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Client '{}' not found",
                client_id
            )));
        }

        tracing::info!("Client '{}' is_active set to {}", client_id, is_active);
        Ok(())
    }

    /// Administrative policy update (size cap and allowed extensions).
    pub async fn update_policy(
        &self,
        client_id: &str,
        max_file_size_bytes: i64,
        allowed_extensions: &[String],
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET max_file_size_bytes = $2, allowed_extensions = $3, updated_at = NOW()
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .bind(max_file_size_bytes)
        .bind(allowed_extensions)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Client '{}' not found",
                client_id
            )));
        }

        tracing::info!("Client '{}' policy updated", client_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_client(is_active: bool, secret: &str) -> Client {
        Client {
            id: Uuid::new_v4(),
            client_id: "CLI-00123".to_string(),
            client_name: "Test Client".to_string(),
            token_hash: hash_token(secret),
            container_prefix: "cli-00123".to_string(),
            is_active,
            max_file_size_bytes: 10 * 1024 * 1024,
            allowed_extensions: vec!["csv".to_string(), "json".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn matching_secret_authorizes_active_client() {
        let client = test_client(true, "token-secreto-123");
        assert!(credentials_match(&client, &hash_token("token-secreto-123")));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let client = test_client(true, "token-secreto-123");
        assert!(!credentials_match(&client, &hash_token("wrong")));
    }

    #[test]
    fn inactive_client_is_rejected_even_with_correct_secret() {
        let client = test_client(false, "token-secreto-123");
        assert!(!credentials_match(&client, &hash_token("token-secreto-123")));
    }

    #[test]
    fn token_hash_is_sha256_hex() {
        // Digest length and stability; never the plaintext.
        let hash = hash_token("secret");
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, "secret");
        assert_eq!(hash, hash_token("secret"));
    }

    #[test]
    fn extension_policy_is_case_insensitive() {
        let client = test_client(true, "s");
        assert!(client.allows_extension("CSV"));
        assert!(client.allows_extension("json"));
        assert!(!client.allows_extension("parquet"));
    }
}
