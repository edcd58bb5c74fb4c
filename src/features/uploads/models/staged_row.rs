use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// One materialized data row of an accepted file. Append-only: written by
/// the staging loader inside a single transaction, never mutated.
#[derive(Debug, Clone, FromRow)]
pub struct StagedRow {
    pub id: i64,
    pub file_id: Uuid,
    /// Denormalized from the file record for query isolation
    pub client_id: Uuid,
    /// 1-based position in the source file
    pub row_number: i64,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
