//! Client error types.

/// Error type for explorer API operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{path} returned status {status}")]
    Status { path: String, status: u16 },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

/// Result type for explorer API operations.
pub type ClientResult<T> = Result<T, ClientError>;
