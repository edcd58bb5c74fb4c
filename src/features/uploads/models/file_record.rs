use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// File record status enum matching database enum.
///
/// The transition graph is closed and lives here; every status write goes
/// through a conditional update keyed on the expected current status, so an
/// invalid transition can never be persisted no matter what a caller does.
///
/// ```text
/// uploaded -> validating -> validated -> loaded
///                        \-> rejected  \-> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "file_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Uploaded,
    Validating,
    Validated,
    Rejected,
    Loaded,
    Failed,
}

impl FileStatus {
    /// Terminal statuses admit no further automatic transition.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FileStatus::Rejected | FileStatus::Loaded | FileStatus::Failed
        )
    }

    /// The closed transition table.
    pub fn can_transition(self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (FileStatus::Uploaded, FileStatus::Validating)
                | (FileStatus::Validating, FileStatus::Validated)
                | (FileStatus::Validating, FileStatus::Rejected)
                | (FileStatus::Validated, FileStatus::Loaded)
                | (FileStatus::Validated, FileStatus::Failed)
        )
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Uploaded => write!(f, "uploaded"),
            FileStatus::Validating => write!(f, "validating"),
            FileStatus::Validated => write!(f, "validated"),
            FileStatus::Rejected => write!(f, "rejected"),
            FileStatus::Loaded => write!(f, "loaded"),
            FileStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Database model for one uploaded object: the authoritative status ledger.
#[derive(Debug, Clone, FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub client_id: Uuid,
    pub original_filename: String,
    pub storage_key: String,
    pub extension: String,
    pub size_bytes: i64,
    pub status: FileStatus,
    pub validation_errors: Option<serde_json::Value>,
    pub validation_warnings: Option<serde_json::Value>,
    pub validation_metadata: Option<serde_json::Value>,
    pub failure_reason: Option<String>,
    pub rows_loaded: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub loaded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::FileStatus::*;

    const ALL: [super::FileStatus; 6] = [Uploaded, Validating, Validated, Rejected, Loaded, Failed];

    #[test]
    fn transition_graph_matches_the_state_machine() {
        assert!(Uploaded.can_transition(Validating));
        assert!(Validating.can_transition(Validated));
        assert!(Validating.can_transition(Rejected));
        assert!(Validated.can_transition(Loaded));
        assert!(Validated.can_transition(Failed));
    }

    #[test]
    fn no_transition_skips_validating() {
        assert!(!Uploaded.can_transition(Validated));
        assert!(!Uploaded.can_transition(Rejected));
        assert!(!Uploaded.can_transition(Loaded));
        assert!(!Uploaded.can_transition(Failed));
    }

    #[test]
    fn terminal_statuses_admit_no_transition() {
        for from in [Rejected, Loaded, Failed] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition(to), "{} -> {} must be invalid", from, to);
            }
        }
    }

    #[test]
    fn no_self_transitions() {
        for s in ALL {
            assert!(!s.can_transition(s));
        }
    }
}
