//! In-memory explorer source for tests.

use async_trait::async_trait;
use dartsia_core::{RawBlock, RawBlockStats, RawHost, RawNetworkStats, RawTransaction};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ClientError, ClientResult};
use crate::source::ExplorerSource;

#[derive(Default)]
pub struct StaticSource {
    pub hosts: Option<Vec<RawHost>>,
    pub blocks: HashMap<String, RawBlock>,
    pub tip: Option<RawBlock>,
    pub block_stats: Option<RawBlockStats>,
    pub transactions: HashMap<String, RawTransaction>,
    pub stats: Option<RawNetworkStats>,
    pub calls: AtomicUsize,
}

impl StaticSource {
    pub fn with_hosts(hosts: Value) -> Self {
        Self {
            hosts: Some(serde_json::from_value(hosts).unwrap()),
            ..Self::default()
        }
    }

    pub fn add_block(&mut self, key: &str, block: Value) {
        self.blocks
            .insert(key.to_string(), serde_json::from_value(block).unwrap());
    }

    pub fn add_transaction(&mut self, id: &str, tx: Value) {
        self.transactions
            .insert(id.to_string(), serde_json::from_value(tx).unwrap());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExplorerSource for StaticSource {
    async fn hosts(&self) -> ClientResult<Vec<RawHost>> {
        self.record();
        self.hosts
            .clone()
            .ok_or_else(|| ClientError::Status { path: "/hosts".to_string(), status: 503 })
    }

    async fn blocks(&self, _page: u32, limit: u32) -> ClientResult<Vec<RawBlock>> {
        self.record();
        Ok(self.blocks.values().take(limit as usize).cloned().collect())
    }

    async fn block(&self, id: &str) -> ClientResult<RawBlock> {
        self.record();
        self.blocks
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("/blocks/{}", id)))
    }

    async fn tip(&self) -> ClientResult<RawBlock> {
        self.record();
        self.tip
            .clone()
            .ok_or_else(|| ClientError::NotFound("/blocks/tip".to_string()))
    }

    async fn block_stats(&self) -> ClientResult<RawBlockStats> {
        self.record();
        self.block_stats
            .clone()
            .ok_or_else(|| ClientError::NotFound("/blocks/stats".to_string()))
    }

    async fn recent_transactions(&self, limit: u32) -> ClientResult<Vec<RawTransaction>> {
        self.record();
        Ok(self.transactions.values().take(limit as usize).cloned().collect())
    }

    async fn transaction(&self, id: &str) -> ClientResult<RawTransaction> {
        self.record();
        self.transactions
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("/tx/{}", id)))
    }

    async fn network_stats(&self) -> ClientResult<RawNetworkStats> {
        self.record();
        self.stats
            .clone()
            .ok_or_else(|| ClientError::Status { path: "/network/stats".to_string(), status: 500 })
    }
}
