//! Custom error types for gh-release with improved type safety and error handling.

use std::time::Duration;

use thiserror::Error;

/// Main error type for release reconciliation and asset upload.
#[derive(Error, Debug)]
pub enum ReleaseError {
    // Configuration errors
    #[error("⚠️ GitHub Releases requires a tag")]
    MissingTag,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // File pattern errors
    #[error("⚠️ Pattern '{0}' does not match any files.")]
    UnmatchedPattern(String),

    #[error("⚠️ {0} not include valid file.")]
    NoValidFiles(String),

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // Throttle signals
    #[error(
        "Request quota exhausted for request {method} {url} (retry after {}s)",
        retry_after.as_secs()
    )]
    RateLimited {
        method: String,
        url: String,
        retry_after: Duration,
    },

    #[error("Abuse detected for request {method} {url}")]
    AbuseDetected {
        method: String,
        url: String,
        retry_after: Option<Duration>,
    },

    // Remote API errors
    #[error("{method} {url} failed with status {status}: {message}")]
    Api {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    #[error("Network request failed: {0}")]
    NetworkError(String),

    #[error("API authentication failed: {0}")]
    AuthenticationError(String),

    // Local I/O and parsing errors - automatic conversions via #[from]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

/// Result type alias using ReleaseError
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an error for a response the API rejected
    pub fn api(
        method: impl Into<String>,
        url: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Api {
            method: method.into(),
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// True when the API answered 404 for the request.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

// Implement From for reqwest errors (network/API)
impl From<reqwest::Error> for ReleaseError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status.as_u16() == 401 => {
                Self::AuthenticationError(err.to_string())
            }
            _ => Self::NetworkError(err.to_string()),
        }
    }
}

// Implement From for reqwest header errors (needs custom message)
impl From<reqwest::header::InvalidHeaderValue> for ReleaseError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::AuthenticationError(format!("Invalid header value: {}", err))
    }
}
