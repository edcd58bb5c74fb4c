//! Storage key layout and namespace isolation.
//!
//! Every object key has the shape
//! `{namespace}/{container_prefix}/{YYYY}/{MM}/{DD}/{file}`.
//! The namespace segment is the pipeline stage the object lives in and the
//! container prefix is the owning client's isolation boundary. All key
//! construction goes through these helpers; nothing else in the codebase
//! concatenates storage paths.

use chrono::{DateTime, Datelike, Utc};

/// Pipeline stage namespaces inside the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageNamespace {
    /// Freshly received objects awaiting validation
    Uploads,
    /// Accepted objects ready for the staging loader
    Staging,
    /// Rejected objects kept with their diagnostic report
    Rejected,
    /// Report artifacts for terminal outcomes
    Reports,
}

impl StorageNamespace {
    pub fn prefix(self) -> &'static str {
        match self {
            StorageNamespace::Uploads => "uploads",
            StorageNamespace::Staging => "staging",
            StorageNamespace::Rejected => "rejected",
            StorageNamespace::Reports => "reports",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "uploads" => Some(StorageNamespace::Uploads),
            "staging" => Some(StorageNamespace::Staging),
            "rejected" => Some(StorageNamespace::Rejected),
            "reports" => Some(StorageNamespace::Reports),
            _ => None,
        }
    }
}

/// Build a date-partitioned object key inside a client's namespace.
pub fn object_key(
    namespace: StorageNamespace,
    container_prefix: &str,
    at: DateTime<Utc>,
    file: &str,
) -> String {
    format!(
        "{}/{}/{}/{:02}/{:02}/{}",
        namespace.prefix(),
        container_prefix,
        at.year(),
        at.month(),
        at.day(),
        file
    )
}

/// Rewrite a key into another namespace, keeping the client/date/file part.
/// Returns `None` if the key does not carry a known namespace prefix.
pub fn rekey(key: &str, to: StorageNamespace) -> Option<String> {
    let (prefix, rest) = key.split_once('/')?;
    StorageNamespace::from_prefix(prefix)?;
    Some(format!("{}/{}", to.prefix(), rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn key_layout_is_date_partitioned() {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let key = object_key(StorageNamespace::Uploads, "cli-00123", at, "ab12cd34_data.csv");
        assert_eq!(key, "uploads/cli-00123/2026/03/07/ab12cd34_data.csv");
    }

    #[test]
    fn rekey_swaps_only_the_namespace() {
        let key = "uploads/cli-00123/2026/03/07/ab12cd34_data.csv";
        assert_eq!(
            rekey(key, StorageNamespace::Staging).as_deref(),
            Some("staging/cli-00123/2026/03/07/ab12cd34_data.csv")
        );
        assert_eq!(
            rekey(key, StorageNamespace::Rejected).as_deref(),
            Some("rejected/cli-00123/2026/03/07/ab12cd34_data.csv")
        );
    }

    #[test]
    fn rekey_refuses_foreign_keys() {
        assert_eq!(rekey("tmp/cli-00123/file.csv", StorageNamespace::Staging), None);
        assert_eq!(rekey("no-slash", StorageNamespace::Staging), None);
    }
}
