//! Error types for Zpcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ZpcastError>;

#[derive(Error, Debug)]
pub enum ZpcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dictionary error: {0}")]
    Dictionary(#[from] FetchError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ZpcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ZpcastError::Config(_) => 2,
            ZpcastError::Platform(PlatformError::Authentication(_))
            | ZpcastError::Platform(PlatformError::Session(_)) => 3,
            ZpcastError::InvalidInput(_) => 4,
            ZpcastError::Platform(_) => 1,
            ZpcastError::Dictionary(_) => 1,
            ZpcastError::Cache(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// A single schema mismatch found while decoding a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path to the offending field, e.g. `words[0].number`
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build an issue from a path-tracking decode failure.
    ///
    /// serde reports a missing field at the path of the object that lacks it,
    /// so the field name is appended to give the path of the field itself.
    pub fn from_path_error(error: &serde_path_to_error::Error<serde_json::Error>) -> Self {
        let base = error.path().to_string();
        let message = error.inner().to_string();

        let path = match missing_field_name(&message) {
            Some(field) if base == "." => field.to_string(),
            Some(field) => format!("{}.{}", base, field),
            None => base,
        };

        Self { path, message }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn missing_field_name(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure of a single request/response exchange with an external HTTP API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} {status_text}")]
    Http { status: u16, status_text: String },

    #[error("Failed to parse response body: {0}")]
    Parse(String),

    #[error("Response did not match the expected schema: {}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unidentified error: {0}")]
    Unidentified(String),
}

impl FetchError {
    /// Build an `Http` error from a non-success status code
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        FetchError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() || error.is_request() {
            FetchError::Network(error.to_string())
        } else if let Some(status) = error.status() {
            FetchError::from_status(status)
        } else if error.is_decode() || error.is_body() {
            FetchError::Parse(error.to_string())
        } else {
            FetchError::Unidentified(error.to_string())
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Session request failed: {0}")]
    Session(#[source] FetchError),

    #[error("Record request failed: {0}")]
    Record(#[source] FetchError),
}

impl PlatformError {
    /// The underlying fetch failure, if this error came from an HTTP exchange
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            PlatformError::Session(e) | PlatformError::Record(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid cache record: {0}")]
    Record(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_config_error() {
        let error = ZpcastError::Config(ConfigError::MissingEnv("ZPDIC_API_KEY".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_authentication_error() {
        let error = ZpcastError::Platform(PlatformError::Authentication(
            "Not authenticated".to_string(),
        ));
        assert_eq!(error.exit_code(), 3);

        let session = ZpcastError::Platform(PlatformError::Session(FetchError::Http {
            status: 401,
            status_text: "Unauthorized".to_string(),
        }));
        assert_eq!(session.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_invalid_input() {
        let error = ZpcastError::InvalidInput("index must be non-negative".to_string());
        assert_eq!(error.exit_code(), 4);
    }

    #[test]
    fn test_exit_code_runtime_errors() {
        let dictionary = ZpcastError::Dictionary(FetchError::NotFound("empty".to_string()));
        assert_eq!(dictionary.exit_code(), 1);

        let record = ZpcastError::Platform(PlatformError::Record(FetchError::Http {
            status: 502,
            status_text: "Bad Gateway".to_string(),
        }));
        assert_eq!(record.exit_code(), 1);

        let cache = ZpcastError::Cache(CacheError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )));
        assert_eq!(cache.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_http() {
        let error = ZpcastError::Dictionary(FetchError::Http {
            status: 404,
            status_text: "Not Found".to_string(),
        });
        assert_eq!(format!("{}", error), "Dictionary error: HTTP 404 Not Found");
    }

    #[test]
    fn test_error_message_formatting_missing_env() {
        let error = ZpcastError::Config(ConfigError::MissingEnv("BSKY_PASSWORD".to_string()));
        assert_eq!(
            format!("{}", error),
            "Configuration error: Missing required environment variable: BSKY_PASSWORD"
        );
    }

    #[test]
    fn test_validation_message_lists_every_issue() {
        let error = FetchError::Validation(vec![
            ValidationIssue::new("total", "missing field `total`"),
            ValidationIssue::new("words[0].number", "invalid type"),
        ]);
        let message = error.to_string();
        assert!(message.contains("total: missing field `total`"));
        assert!(message.contains("words[0].number: invalid type"));
    }

    #[test]
    fn test_issue_from_missing_root_field() {
        let json = serde_json::json!({ "words": [] });
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Body {
            words: Vec<u8>,
            total: i64,
        }

        let err = serde_path_to_error::deserialize::<_, Body>(json).unwrap_err();
        let issue = ValidationIssue::from_path_error(&err);
        assert_eq!(issue.path, "total");
        assert!(issue.message.contains("missing field `total`"));
    }

    #[test]
    fn test_issue_from_nested_type_mismatch() {
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Inner {
            number: i64,
        }
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Body {
            words: Vec<Inner>,
        }

        let json = serde_json::json!({ "words": [{ "number": "42" }] });
        let err = serde_path_to_error::deserialize::<_, Body>(json).unwrap_err();
        let issue = ValidationIssue::from_path_error(&err);
        assert_eq!(issue.path, "words[0].number");
    }

    #[test]
    fn test_platform_error_exposes_fetch_error() {
        let inner = FetchError::Http {
            status: 401,
            status_text: "Unauthorized".to_string(),
        };
        let error = PlatformError::Session(inner.clone());
        assert_eq!(error.fetch_error(), Some(&inner));
        assert!(PlatformError::Posting("x".to_string()).fetch_error().is_none());
    }

    #[test]
    fn test_error_conversion_from_fetch_error() {
        let error: ZpcastError = FetchError::NotFound("offset 3".to_string()).into();
        match error {
            ZpcastError::Dictionary(FetchError::NotFound(msg)) => assert_eq!(msg, "offset 3"),
            _ => panic!("Expected ZpcastError::Dictionary"),
        }
    }
}
