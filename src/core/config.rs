use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Object storage configuration (MinIO or any S3-compatible endpoint).
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Backend selector: "minio" (default) or "memory" for local demo runs
    pub backend: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

/// Severity assigned to a non-fatal validation observation.
///
/// The warnings-vs-errors split is an explicit policy table rather than a
/// hardcoded list; operators can reclassify each observation per env.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Ignore,
}

impl Severity {
    fn parse(value: &str, var: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "ignore" => Ok(Severity::Ignore),
            other => Err(format!(
                "{} must be one of error|warning|ignore, got '{}'",
                var, other
            )),
        }
    }
}

/// Classification of validation observations that are not hard failures.
#[derive(Debug, Clone, Copy)]
pub struct ValidationPolicy {
    /// Header row contains the same column name twice
    pub duplicate_headers: Severity,
    /// A data row where every field is empty
    pub empty_rows: Severity,
    /// A data row whose field count differs from the header
    pub ragged_rows: Severity,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        // Ragged rows default to error: they break row countability.
        Self {
            duplicate_headers: Severity::Warning,
            empty_rows: Severity::Warning,
            ragged_rows: Severity::Error,
        }
    }
}

/// Per-format structural limits, mirrored from the upstream rule table.
#[derive(Debug, Clone, Copy)]
pub struct FormatRules {
    pub csv_max_rows: i64,
    pub csv_max_columns: usize,
    pub json_max_size_bytes: usize,
    pub txt_max_size_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Time budget for a single validation run
    pub validation_timeout_secs: u64,
    /// Time budget for a single staging load
    pub load_timeout_secs: u64,
    /// How often the sweeper looks for stuck records
    pub sweep_interval_secs: u64,
    /// Age after which a non-terminal record counts as stuck
    pub stuck_after_secs: i64,
    /// Capacity of the in-process object-created event channel
    pub event_buffer: usize,
    pub rules: FormatRules,
    pub policy: ValidationPolicy,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            pipeline: PipelineConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> Result<T, String> {
    match env::var(var) {
        Ok(s) => s
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", var)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 512 * 1024 * 1024; // 512MB, above any client cap

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size =
            env_parse("MAX_REQUEST_BODY_SIZE", Self::DEFAULT_MAX_REQUEST_BODY_SIZE)?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: env_parse("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: env_parse("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: env_parse(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: env_parse("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
        })
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "minio".to_string());
        if backend != "minio" && backend != "memory" {
            return Err(format!(
                "STORAGE_BACKEND must be 'minio' or 'memory', got '{}'",
                backend
            ));
        }

        Ok(Self {
            backend,
            endpoint: env::var("MINIO_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            access_key: env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            secret_key: env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            bucket: env::var("MINIO_BUCKET").unwrap_or_else(|_| "dataport-objects".to_string()),
            region: env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        })
    }
}

impl PipelineConfig {
    const DEFAULT_VALIDATION_TIMEOUT_SECS: u64 = 120;
    const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 300;
    const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
    const DEFAULT_STUCK_AFTER_SECS: i64 = 600;
    const DEFAULT_EVENT_BUFFER: usize = 1024;
    const DEFAULT_CSV_MAX_ROWS: i64 = 10_000_000;
    const DEFAULT_CSV_MAX_COLUMNS: usize = 500;
    const DEFAULT_JSON_MAX_SIZE_BYTES: usize = 200 * 1024 * 1024;
    const DEFAULT_TXT_MAX_SIZE_BYTES: usize = 100 * 1024 * 1024;

    pub fn from_env() -> Result<Self, String> {
        let severity = |var: &str, default: Severity| -> Result<Severity, String> {
            match env::var(var) {
                Ok(s) => Severity::parse(&s, var),
                Err(_) => Ok(default),
            }
        };

        let defaults = ValidationPolicy::default();
        let policy = ValidationPolicy {
            duplicate_headers: severity("POLICY_DUPLICATE_HEADERS", defaults.duplicate_headers)?,
            empty_rows: severity("POLICY_EMPTY_ROWS", defaults.empty_rows)?,
            ragged_rows: severity("POLICY_RAGGED_ROWS", defaults.ragged_rows)?,
        };

        Ok(Self {
            validation_timeout_secs: env_parse(
                "VALIDATION_TIMEOUT_SECS",
                Self::DEFAULT_VALIDATION_TIMEOUT_SECS,
            )?,
            load_timeout_secs: env_parse("LOAD_TIMEOUT_SECS", Self::DEFAULT_LOAD_TIMEOUT_SECS)?,
            sweep_interval_secs: env_parse(
                "SWEEP_INTERVAL_SECS",
                Self::DEFAULT_SWEEP_INTERVAL_SECS,
            )?,
            stuck_after_secs: env_parse("STUCK_AFTER_SECS", Self::DEFAULT_STUCK_AFTER_SECS)?,
            event_buffer: env_parse("PIPELINE_EVENT_BUFFER", Self::DEFAULT_EVENT_BUFFER)?,
            rules: FormatRules {
                csv_max_rows: env_parse("CSV_MAX_ROWS", Self::DEFAULT_CSV_MAX_ROWS)?,
                csv_max_columns: env_parse("CSV_MAX_COLUMNS", Self::DEFAULT_CSV_MAX_COLUMNS)?,
                json_max_size_bytes: env_parse(
                    "JSON_MAX_SIZE_BYTES",
                    Self::DEFAULT_JSON_MAX_SIZE_BYTES,
                )?,
                txt_max_size_bytes: env_parse(
                    "TXT_MAX_SIZE_BYTES",
                    Self::DEFAULT_TXT_MAX_SIZE_BYTES,
                )?,
            },
            policy,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Dataport API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Authenticated file intake, validation and staging pipeline".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
