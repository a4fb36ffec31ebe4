//! Source-of-records interface for the explorer.
//!
//! Everything above the transport (search routing, refresh cycles, the CLI)
//! talks to this trait, so the HTTP client can be swapped for a fixture or
//! a different backend without touching the callers.

use async_trait::async_trait;
use dartsia_core::{RawBlock, RawBlockStats, RawHost, RawNetworkStats, RawTransaction};

use crate::error::ClientResult;

/// Read-only access to explorer records.
#[async_trait]
pub trait ExplorerSource: Send + Sync {
    /// All known hosts (`GET /hosts`).
    async fn hosts(&self) -> ClientResult<Vec<RawHost>>;

    /// A page of recent blocks (`GET /blocks`).
    ///
    /// # Arguments
    /// * `page` - 1-based page number
    /// * `limit` - Blocks per page
    async fn blocks(&self, page: u32, limit: u32) -> ClientResult<Vec<RawBlock>>;

    /// A block by id or height (`GET /blocks/:id`).
    async fn block(&self, id: &str) -> ClientResult<RawBlock>;

    /// The chain tip (`GET /blocks/tip`).
    async fn tip(&self) -> ClientResult<RawBlock>;

    /// Recent block production statistics (`GET /blocks/stats`).
    async fn block_stats(&self) -> ClientResult<RawBlockStats>;

    /// Most recent transactions (`GET /tx/recent`).
    async fn recent_transactions(&self, limit: u32) -> ClientResult<Vec<RawTransaction>>;

    /// A transaction by id (`GET /tx/:id`).
    async fn transaction(&self, id: &str) -> ClientResult<RawTransaction>;

    /// Backend network statistics (`GET /network/stats`).
    async fn network_stats(&self) -> ClientResult<RawNetworkStats>;
}
