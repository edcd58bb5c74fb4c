use serde_json::{json, Value};

use crate::core::config::{FormatRules, Severity, ValidationPolicy};

/// Parseable file formats. Extensions outside this set are turned away at
/// intake, so the pipeline only ever sees these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
    Txt,
}

impl FileFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "json" => Some(FileFormat::Json),
            "txt" => Some(FileFormat::Txt),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Txt => "txt",
        }
    }
}

/// Binary signatures that rule out a text payload regardless of extension.
const SIGNATURES: [(&[u8], &str); 5] = [
    (b"PK\x03\x04", "a zip archive"),
    (b"PAR1", "a parquet file"),
    (b"%PDF", "a pdf document"),
    (b"\x1f\x8b", "gzip data"),
    (b"\x89PNG", "a png image"),
];

fn signature_mismatch(format: FileFormat, bytes: &[u8]) -> Option<String> {
    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, name)| {
            format!(
                "Content looks like {}, not {}",
                name,
                format.as_str()
            )
        })
}

/// Decode with a fixed ladder: UTF-8 first, Latin-1 as the fallback.
/// Latin-1 maps every byte to a char, so this never fails.
fn decode_text(bytes: &[u8]) -> (String, &'static str) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), "utf-8"),
        Err(_) => (bytes.iter().map(|&b| b as char).collect(), "latin-1"),
    }
}

/// Outcome of inspecting one object: diagnostics plus the materialized
/// row payloads. `rows` is only meaningful when `passed()`.
#[derive(Debug)]
pub struct Inspection {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: Value,
    pub rows: Vec<Value>,
}

impl Inspection {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn failed(error: String, metadata: Value) -> Self {
        Self {
            errors: vec![error],
            warnings: Vec::new(),
            metadata,
            rows: Vec::new(),
        }
    }
}

struct Observations {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Observations {
    fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn observe(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Error => self.errors.push(message),
            Severity::Warning => self.warnings.push(message),
            Severity::Ignore => {}
        }
    }
}

/// Inspect one object: structural checks, policy observations and row
/// materialization in a single pass. Pure; the same bytes with the same
/// config always produce the same result, which is what makes redelivery
/// and crash recovery safe.
pub fn inspect(
    format: FileFormat,
    bytes: &[u8],
    rules: &FormatRules,
    policy: &ValidationPolicy,
) -> Inspection {
    if let Some(mismatch) = signature_mismatch(format, bytes) {
        return Inspection::failed(mismatch, json!({ "format": format.as_str() }));
    }

    match format {
        FileFormat::Csv => inspect_csv(bytes, rules, policy),
        FileFormat::Json => inspect_json(bytes, rules),
        FileFormat::Txt => inspect_txt(bytes, rules, policy),
    }
}

/// RFC 4180 row enumeration. Quoted fields may contain commas, newlines
/// and doubled quotes; an unterminated quote is a structural error.
fn parse_csv(text: &str) -> Result<Vec<Vec<String>>, String> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quote_line = 0usize;
    let mut line = 1usize;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' if field.is_empty() => {
                    in_quotes = true;
                    quote_line = line;
                }
                ',' => row.push(std::mem::take(&mut field)),
                // Swallow only the \r of a CRLF pair; a bare \r is field data
                '\r' => {
                    if chars.peek() != Some(&'\n') {
                        field.push('\r');
                    }
                }
                '\n' => {
                    line += 1;
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err(format!(
            "Unterminated quoted field starting at line {}",
            quote_line
        ));
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

fn is_empty_row(row: &[String]) -> bool {
    row.iter().all(|f| f.trim().is_empty())
}

fn duplicate_headers(header: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut dupes: Vec<String> = Vec::new();
    for name in header {
        let lowered = name.to_lowercase();
        if seen.contains(&lowered) {
            if !dupes.contains(name) {
                dupes.push(name.clone());
            }
        } else {
            seen.push(lowered);
        }
    }
    dupes
}

fn inspect_csv(bytes: &[u8], rules: &FormatRules, policy: &ValidationPolicy) -> Inspection {
    let (text, encoding) = decode_text(bytes);
    let base_metadata = json!({ "format": "csv", "encoding": encoding });

    let parsed = match parse_csv(&text) {
        Ok(rows) => rows,
        Err(e) => return Inspection::failed(e, base_metadata),
    };

    let Some((header, data)) = parsed.split_first() else {
        return Inspection::failed("File contains no header row".to_string(), base_metadata);
    };
    if is_empty_row(header) {
        return Inspection::failed("Header row is empty".to_string(), base_metadata);
    }

    let mut obs = Observations::new();

    if header.len() > rules.csv_max_columns {
        obs.errors.push(format!(
            "Header has {} columns, limit is {}",
            header.len(),
            rules.csv_max_columns
        ));
    }
    if data.len() as i64 > rules.csv_max_rows {
        obs.errors.push(format!(
            "File has {} data rows, limit is {}",
            data.len(),
            rules.csv_max_rows
        ));
    }

    for name in duplicate_headers(header) {
        obs.observe(
            policy.duplicate_headers,
            format!("Duplicate header column '{}'", name),
        );
    }

    let mut rows: Vec<Value> = Vec::with_capacity(data.len());
    let mut empty_count = 0usize;
    for (i, row) in data.iter().enumerate() {
        let line = i + 2; // line 1 is the header

        if is_empty_row(row) {
            empty_count += 1;
            obs.observe(policy.empty_rows, format!("Empty row at line {}", line));
            continue;
        }

        if row.len() != header.len() {
            obs.observe(
                policy.ragged_rows,
                format!(
                    "Row at line {} has {} fields, expected {}",
                    line,
                    row.len(),
                    header.len()
                ),
            );
            // Ragged rows cannot be keyed by header; stage positionally.
            rows.push(json!(row));
            continue;
        }

        let object: serde_json::Map<String, Value> = header
            .iter()
            .zip(row.iter())
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        rows.push(Value::Object(object));
    }

    // Very wide files would bloat the report; cap the listed header names.
    let listed_header: Vec<&String> = header.iter().take(50).collect();

    Inspection {
        errors: obs.errors,
        warnings: obs.warnings,
        metadata: json!({
            "format": "csv",
            "encoding": encoding,
            "header": listed_header,
            "column_count": header.len(),
            "row_count": data.len(),
            "empty_row_count": empty_count,
        }),
        rows,
    }
}

fn inspect_json(bytes: &[u8], rules: &FormatRules) -> Inspection {
    let base_metadata = json!({ "format": "json" });

    if bytes.len() > rules.json_max_size_bytes {
        return Inspection::failed(
            format!(
                "JSON file is {} bytes, limit is {}",
                bytes.len(),
                rules.json_max_size_bytes
            ),
            base_metadata,
        );
    }

    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => return Inspection::failed(format!("Invalid JSON: {}", e), base_metadata),
    };

    let rows = match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Inspection::failed(
                    "JSON array contains no elements".to_string(),
                    base_metadata,
                );
            }
            items
        }
        Value::Object(_) => vec![value],
        _ => {
            return Inspection::failed(
                "Top-level JSON value must be an object or an array".to_string(),
                base_metadata,
            )
        }
    };

    Inspection {
        errors: Vec::new(),
        warnings: Vec::new(),
        metadata: json!({ "format": "json", "row_count": rows.len() }),
        rows,
    }
}

fn inspect_txt(bytes: &[u8], rules: &FormatRules, policy: &ValidationPolicy) -> Inspection {
    let base_metadata = json!({ "format": "txt" });

    if bytes.len() > rules.txt_max_size_bytes {
        return Inspection::failed(
            format!(
                "Text file is {} bytes, limit is {}",
                bytes.len(),
                rules.txt_max_size_bytes
            ),
            base_metadata,
        );
    }

    let (text, encoding) = decode_text(bytes);

    let mut obs = Observations::new();
    let mut rows: Vec<Value> = Vec::new();
    let mut line_count = 0usize;
    for (i, raw) in text.lines().enumerate() {
        line_count += 1;
        if raw.trim().is_empty() {
            obs.observe(policy.empty_rows, format!("Empty line at line {}", i + 1));
            continue;
        }
        rows.push(Value::String(raw.to_string()));
    }

    if rows.is_empty() {
        obs.errors.push("File contains no content".to_string());
    }

    Inspection {
        errors: obs.errors,
        warnings: obs.warnings,
        metadata: json!({
            "format": "txt",
            "encoding": encoding,
            "line_count": line_count,
            "row_count": rows.len(),
        }),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> FormatRules {
        FormatRules {
            csv_max_rows: 1000,
            csv_max_columns: 10,
            json_max_size_bytes: 1024,
            txt_max_size_bytes: 1024,
        }
    }

    fn policy() -> ValidationPolicy {
        ValidationPolicy::default()
    }

    fn inspect_csv_str(text: &str) -> Inspection {
        inspect(FileFormat::Csv, text.as_bytes(), &rules(), &policy())
    }

    #[test]
    fn csv_quoted_fields_keep_commas_and_escaped_quotes() {
        let parsed = parse_csv("a,b\n\"x,y\",\"he said \"\"hi\"\"\"\n").unwrap();
        assert_eq!(parsed[1], vec!["x,y", "he said \"hi\""]);
    }

    #[test]
    fn csv_quoted_field_may_span_lines() {
        let parsed = parse_csv("a,b\n\"line1\nline2\",z\n").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1][0], "line1\nline2");
    }

    #[test]
    fn csv_unterminated_quote_is_structural() {
        let result = inspect_csv_str("a,b\n\"unclosed,1\n");
        assert!(!result.passed());
        assert!(result.errors[0].contains("Unterminated"));
        assert!(result.rows.is_empty());
    }

    #[test]
    fn csv_crlf_and_trailing_newline_are_tolerated() {
        let parsed = parse_csv("a,b\r\n1,2\r\n").unwrap();
        assert_eq!(parsed, vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn csv_bare_carriage_return_stays_in_the_field() {
        let parsed = parse_csv("a,b\nx\ry,z\n").unwrap();
        assert_eq!(parsed[1], vec!["x\ry", "z"]);
    }

    #[test]
    fn clean_csv_materializes_keyed_rows() {
        let result = inspect_csv_str("name,age\nalice,30\nbob,41\n");
        assert!(result.passed());
        assert!(result.warnings.is_empty());
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0]["name"], "alice");
        assert_eq!(result.rows[1]["age"], "41");
        assert_eq!(result.metadata["row_count"], 2);
    }

    #[test]
    fn duplicate_headers_warn_by_default_case_insensitively() {
        let result = inspect_csv_str("id,Name,name\n1,a,b\n");
        assert!(result.passed());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("name"));
    }

    #[test]
    fn empty_rows_warn_and_are_not_staged() {
        let result = inspect_csv_str("a,b\n1,2\n,\n3,4\n");
        assert!(result.passed());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.metadata["empty_row_count"], 1);
    }

    #[test]
    fn ragged_rows_reject_by_default() {
        let result = inspect_csv_str("a,b\n1,2,3\n");
        assert!(!result.passed());
        assert!(result.errors[0].contains("3 fields, expected 2"));
    }

    #[test]
    fn ragged_rows_stage_positionally_when_downgraded() {
        let lenient = ValidationPolicy {
            ragged_rows: Severity::Warning,
            ..ValidationPolicy::default()
        };
        let result = inspect(FileFormat::Csv, b"a,b\n1,2,3\n", &rules(), &lenient);
        assert!(result.passed());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.rows[0], serde_json::json!(["1", "2", "3"]));
    }

    #[test]
    fn ignored_observations_leave_no_trace() {
        let silent = ValidationPolicy {
            empty_rows: Severity::Ignore,
            ..ValidationPolicy::default()
        };
        let result = inspect(FileFormat::Csv, b"a,b\n1,2\n,\n", &rules(), &silent);
        assert!(result.passed());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn csv_without_data_rows_passes_with_zero_rows() {
        let result = inspect_csv_str("a,b\n");
        assert!(result.passed());
        assert!(result.rows.is_empty());
    }

    #[test]
    fn csv_column_limit_is_enforced() {
        let header = (0..11).map(|i| format!("c{}", i)).collect::<Vec<_>>().join(",");
        let result = inspect_csv_str(&format!("{}\n", header));
        assert!(!result.passed());
        assert!(result.errors[0].contains("limit is 10"));
    }

    #[test]
    fn csv_row_limit_is_enforced() {
        let tight = FormatRules {
            csv_max_rows: 2,
            ..rules()
        };
        let result = inspect(FileFormat::Csv, b"a\n1\n2\n3\n", &tight, &policy());
        assert!(!result.passed());
        assert!(result.errors[0].contains("limit is 2"));
    }

    #[test]
    fn latin1_content_is_decoded_not_rejected() {
        // 0xE9 is 'é' in Latin-1 and invalid as a UTF-8 start byte here
        let result = inspect(FileFormat::Csv, b"name\ncaf\xe9\n", &rules(), &policy());
        assert!(result.passed());
        assert_eq!(result.metadata["encoding"], "latin-1");
        assert_eq!(result.rows[0]["name"], "café");
    }

    #[test]
    fn json_array_yields_one_row_per_element() {
        let result = inspect(
            FileFormat::Json,
            br#"[{"a": 1}, {"a": 2}]"#,
            &rules(),
            &policy(),
        );
        assert!(result.passed());
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[1]["a"], 2);
    }

    #[test]
    fn json_object_yields_a_single_row() {
        let result = inspect(FileFormat::Json, br#"{"a": 1}"#, &rules(), &policy());
        assert!(result.passed());
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn json_scalar_and_empty_array_are_structural() {
        assert!(!inspect(FileFormat::Json, b"42", &rules(), &policy()).passed());
        assert!(!inspect(FileFormat::Json, b"[]", &rules(), &policy()).passed());
        assert!(!inspect(FileFormat::Json, b"{broken", &rules(), &policy()).passed());
    }

    #[test]
    fn json_size_limit_is_enforced() {
        let big = vec![b' '; 2048];
        let result = inspect(FileFormat::Json, &big, &rules(), &policy());
        assert!(!result.passed());
        assert!(result.errors[0].contains("limit is 1024"));
    }

    #[test]
    fn txt_stages_one_row_per_line_skipping_blanks() {
        let result = inspect(FileFormat::Txt, b"first\n\nsecond\n", &rules(), &policy());
        assert!(result.passed());
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.metadata["line_count"], 3);
    }

    #[test]
    fn txt_with_only_blank_lines_is_structural() {
        let result = inspect(FileFormat::Txt, b"\n\n\n", &rules(), &policy());
        assert!(!result.passed());
    }

    #[test]
    fn wrong_signature_is_rejected_before_parsing() {
        let result = inspect(FileFormat::Csv, b"PK\x03\x04rest", &rules(), &policy());
        assert!(!result.passed());
        assert!(result.errors[0].contains("zip archive"));

        let result = inspect(FileFormat::Csv, b"PAR1xxxx", &rules(), &policy());
        assert!(result.errors[0].contains("parquet"));
    }

    #[test]
    fn format_from_extension_is_case_insensitive() {
        assert_eq!(FileFormat::from_extension("CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension("parquet"), None);
    }
}
