//! HTTP client for the explorer REST API.

use async_trait::async_trait;
use dartsia_core::raw::{parse_blocks, parse_hosts, parse_transactions};
use dartsia_core::{RawBlock, RawBlockStats, RawHost, RawNetworkStats, RawTransaction};
use dartsia_telemetry::Metrics;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::ResponseCache;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::source::ExplorerSource;

/// Explorer API client over HTTP.
pub struct HttpExplorer {
    client: Client,
    api_root: Url,
    cache: Arc<dyn ResponseCache>,
    cache_ttl: Duration,
    metrics: Metrics,
}

impl HttpExplorer {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `config` - Server location, API key and timing
    /// * `cache` - Response cache consulted before every GET
    /// * `metrics` - Metrics collector
    pub fn new(
        config: &ClientConfig,
        cache: Arc<dyn ResponseCache>,
        metrics: Metrics,
    ) -> ClientResult<Self> {
        let api_root = Url::parse(&config.api_root())
            .map_err(|e| ClientError::InvalidConfig(format!("{}: {}", config.base_url, e)))?;
        if api_root.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref() {
            let value = HeaderValue::from_str(key)
                .map_err(|e| ClientError::InvalidConfig(format!("api key: {}", e)))?;
            headers.insert("x-api-key", value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        info!("Initialized explorer client for {}", api_root);

        Ok(Self {
            client,
            api_root,
            cache,
            cache_ttl: config.cache_ttl,
            metrics,
        })
    }

    /// Build an endpoint URL; segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        let mut url = self.api_root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn get_json(&self, operation: &str, url: Url) -> ClientResult<Value> {
        let key = url.to_string();
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await;
        self.metrics
            .observe_api_latency(operation, start.elapsed().as_secs_f64());
        let response = response?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                path: url.path().to_string(),
                status: status.as_u16(),
            });
        }

        let value: Value = response.json().await?;
        self.cache.put(&key, value.clone(), self.cache_ttl);
        debug!("Fetched {}", key);
        Ok(value)
    }

    async fn get<T: DeserializeOwned>(&self, operation: &str, url: Url) -> ClientResult<T> {
        let value = self.get_json(operation, url).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl ExplorerSource for HttpExplorer {
    async fn hosts(&self) -> ClientResult<Vec<RawHost>> {
        let value = self.get_json("get_hosts", self.endpoint(&["hosts"], &[])).await?;
        Ok(parse_hosts(value))
    }

    async fn blocks(&self, page: u32, limit: u32) -> ClientResult<Vec<RawBlock>> {
        let url = self.endpoint(
            &["blocks"],
            &[("page", page.to_string()), ("limit", limit.to_string())],
        );
        Ok(parse_blocks(self.get_json("get_blocks", url).await?))
    }

    async fn block(&self, id: &str) -> ClientResult<RawBlock> {
        self.get("get_block", self.endpoint(&["blocks", id], &[])).await
    }

    async fn tip(&self) -> ClientResult<RawBlock> {
        self.get("get_tip", self.endpoint(&["blocks", "tip"], &[])).await
    }

    async fn block_stats(&self) -> ClientResult<RawBlockStats> {
        self.get("get_block_stats", self.endpoint(&["blocks", "stats"], &[]))
            .await
    }

    async fn recent_transactions(&self, limit: u32) -> ClientResult<Vec<RawTransaction>> {
        let url = self.endpoint(&["tx", "recent"], &[("limit", limit.to_string())]);
        Ok(parse_transactions(
            self.get_json("get_recent_transactions", url).await?,
        ))
    }

    async fn transaction(&self, id: &str) -> ClientResult<RawTransaction> {
        self.get("get_transaction", self.endpoint(&["tx", id], &[])).await
    }

    async fn network_stats(&self) -> ClientResult<RawNetworkStats> {
        self.get("get_network_stats", self.endpoint(&["network", "stats"], &[]))
            .await
    }
}
