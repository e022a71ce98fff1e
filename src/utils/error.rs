use std::path::PathBuf;
use thiserror::Error;

/// Classified failure of the fetch stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} returned for {url}")]
    Http { status: u16, url: String },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("request failed: {0}")]
    Request(String),
}

impl FetchError {
    /// Connection failures, timeouts and gateway-style 5xx responses are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            FetchError::Connection(_) | FetchError::Timeout { .. } => true,
            FetchError::Request(_) => false,
        }
    }
}

/// Classified failure of the write stage.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("permission denied writing {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("value {value:?} cannot be represented in {encoding}")]
    Encoding { value: String, encoding: String },

    #[error("target directory for {} does not exist", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => WriteError::PermissionDenied { path },
            std::io::ErrorKind::NotFound => WriteError::DirectoryNotFound { path },
            _ => WriteError::Io { path, source },
        }
    }
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    FetchError(#[from] FetchError),

    #[error("Response format error: {message}")]
    FormatError { message: String },

    #[error("Write failed: {0}")]
    WriteError(#[from] WriteError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },
}

impl EtlError {
    /// Console text for the failure, one wording per category.
    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::FetchError(FetchError::Http { status, url }) => {
                format!("An HTTP error occurred: {} for url: {}", status, url)
            }
            EtlError::FetchError(FetchError::Connection(_)) => {
                "A connection error occurred. Check your internet connection or API URL format."
                    .to_string()
            }
            EtlError::FetchError(FetchError::Timeout { .. }) => {
                "Your request timed out.".to_string()
            }
            EtlError::FetchError(FetchError::Request(err)) => {
                format!("An unknown error occurred during your request: {}.", err)
            }
            EtlError::FormatError { .. } => {
                "An error occurred. Response was not in proper JSON format.".to_string()
            }
            EtlError::WriteError(WriteError::PermissionDenied { .. }) => {
                "You don't have permission to write the file.".to_string()
            }
            EtlError::WriteError(WriteError::Encoding { .. }) => {
                "Encoding error. Save with utf-8 or utf-8-sig encoding.".to_string()
            }
            EtlError::WriteError(WriteError::DirectoryNotFound { .. }) => {
                "Targeted folder not found.".to_string()
            }
            EtlError::WriteError(WriteError::Io { source, .. }) => {
                format!(
                    "An unexpected error occurred while saving data to CSV: {}",
                    source
                )
            }
            EtlError::CsvError(_) | EtlError::IoError(_) => format!(
                "An unexpected error occurred while saving data to CSV: {}",
                self
            ),
            EtlError::SerializationError(e) => format!("Could not serialize data: {}", e),
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => format!("Invalid configuration. {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::FetchError(FetchError::Http { .. }) => {
                "Check that the endpoint exists and the server is healthy"
            }
            EtlError::FetchError(FetchError::Connection(_)) => {
                "Check network connectivity and the --api-endpoint value"
            }
            EtlError::FetchError(FetchError::Timeout { .. }) => {
                "Retry later or raise --timeout-secs"
            }
            EtlError::FetchError(FetchError::Request(_)) => "Inspect the request URL and retry",
            EtlError::FormatError { .. } => "The endpoint must return a JSON array of objects",
            EtlError::WriteError(WriteError::PermissionDenied { .. }) => {
                "Choose an --output-path you can write to"
            }
            EtlError::WriteError(WriteError::Encoding { .. }) => {
                "Use --encoding utf8 or --encoding utf8-sig"
            }
            EtlError::WriteError(WriteError::DirectoryNotFound { .. }) => {
                "Create the target directory first"
            }
            EtlError::WriteError(WriteError::Io { .. })
            | EtlError::CsvError(_)
            | EtlError::IoError(_) => "Check free disk space and the output path",
            EtlError::SerializationError(_) => "Report this as a bug",
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Fix the flag or config file value",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let http = |status| FetchError::Http {
            status,
            url: "http://x".to_string(),
        };
        assert!(http(500).is_transient());
        assert!(http(503).is_transient());
        assert!(!http(404).is_transient());
        assert!(!http(501).is_transient());
        assert!(FetchError::Connection("refused".into()).is_transient());
        assert!(FetchError::Timeout { attempts: 1 }.is_transient());
        assert!(!FetchError::Request("bad url".into()).is_transient());
    }

    #[test]
    fn test_write_error_from_io_kind() {
        let denied = WriteError::from_io(
            "out.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(denied, WriteError::PermissionDenied { .. }));

        let missing = WriteError::from_io(
            "missing/out.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(missing, WriteError::DirectoryNotFound { .. }));

        let other = WriteError::from_io("out.csv", std::io::Error::other("disk on fire"));
        assert!(matches!(other, WriteError::Io { .. }));
    }

    #[test]
    fn test_user_friendly_messages_are_distinct() {
        let messages = [
            EtlError::from(FetchError::Http {
                status: 404,
                url: "http://x/users".into(),
            }),
            EtlError::from(FetchError::Connection("refused".into())),
            EtlError::from(FetchError::Timeout { attempts: 5 }),
            EtlError::from(FetchError::Request("weird".into())),
        ]
        .iter()
        .map(|e| e.user_friendly_message())
        .collect::<Vec<_>>();

        assert!(messages[0].contains("404"));
        assert!(messages[1].contains("connection error"));
        assert_eq!(messages[2], "Your request timed out.");
        assert!(messages[3].contains("weird"));
    }
}
