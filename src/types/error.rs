use thiserror::Error;

/// datacent error types
#[derive(Error, Debug)]
pub enum DatacentError {
    /// Transport-level HTTP failure (connect, timeout, TLS)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status code
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Failed to parse a response body or config file
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Date range could not be built
    #[error("invalid date range: {0}")]
    InvalidRange(String),
}

impl From<serde_json::Error> for DatacentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type alias for datacent
pub type Result<T> = std::result::Result<T, DatacentError>;
