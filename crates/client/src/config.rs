//! Transport configuration.

use std::time::Duration;

/// Path of the explorer API below the server root.
pub const API_BASE_PATH: &str = "/api/v1/explorer";

/// Configuration for [`crate::HttpExplorer`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Value sent in the `x-api-key` header.
    pub api_key: Option<String>,
    /// How long a response stays fresh in the cache.
    pub cache_ttl: Duration,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Full URL of the explorer API root, without a trailing slash.
    pub fn api_root(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), API_BASE_PATH)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            cache_ttl: Duration::from_secs(30),
            timeout: Duration::from_secs(15),
        }
    }
}
