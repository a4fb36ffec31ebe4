//! Entity normalization and derived metrics for the Dartsia explorer.
//!
//! Everything in this crate is a pure transform over records returned by the
//! explorer API: raw hosts, blocks, transactions and network stats go in,
//! canonical display values come out. Nothing here performs I/O, so the
//! functions are safe to call from concurrent refresh cycles.

pub mod aggregate;
pub mod chain;
pub mod host;
pub mod network;
pub mod query;
pub mod raw;
pub mod storage;
pub mod time;
pub mod units;

pub use aggregate::{
    aggregate_storage, count_by_freshness, median_storage_price, median_storage_price_within,
    StorageTotals,
};
pub use chain::{BlockStats, BlockSummary, TransactionKind, TransactionSummary};
pub use host::{is_active, FreshnessWindow, Host, HostNormalizer};
pub use network::NetworkStats;
pub use query::{classify, LookupTarget, QueryKind};
pub use raw::{RawAmount, RawBlock, RawBlockStats, RawHost, RawNetworkStats, RawTransaction};
pub use storage::{reconcile, StorageUsage};
