use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating external client identifiers
    /// Uppercase alphanumeric with hyphens, e.g. "CLI-00123"
    pub static ref CLIENT_ID_REGEX: Regex = Regex::new(r"^[A-Z0-9]+(?:-[A-Z0-9]+)*$").unwrap();
}

/// Extract the lowercase extension of a filename, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}

/// Sanitize a client-supplied filename for use inside a storage key:
/// strip any path components and replace whitespace with underscores.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_regex_valid() {
        assert!(CLIENT_ID_REGEX.is_match("CLI-00123"));
        assert!(CLIENT_ID_REGEX.is_match("ACME"));
        assert!(CLIENT_ID_REGEX.is_match("A1-B2-C3"));
    }

    #[test]
    fn client_id_regex_invalid() {
        assert!(!CLIENT_ID_REGEX.is_match("cli-00123")); // lowercase
        assert!(!CLIENT_ID_REGEX.is_match("-CLI")); // starts with hyphen
        assert!(!CLIENT_ID_REGEX.is_match("CLI-")); // ends with hyphen
        assert!(!CLIENT_ID_REGEX.is_match("CLI 123")); // space
        assert!(!CLIENT_ID_REGEX.is_match("")); // empty
    }

    #[test]
    fn extension_extraction() {
        assert_eq!(file_extension("report.CSV"), Some("csv".to_string()));
        assert_eq!(file_extension("a/b/data.json"), Some("json".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".hidden"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn filename_sanitation() {
        assert_eq!(sanitize_filename("my report.csv"), "my_report.csv");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("a\\b\\file name.txt"), "file_name.txt");
    }
}
