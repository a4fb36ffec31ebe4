//! One refresh cycle of the explorer dashboard.

use chrono::{DateTime, Utc};
use dartsia_core::host::HostNormalizer;
use dartsia_core::network::summarize_network;
use dartsia_core::{
    count_by_freshness, BlockStats, BlockSummary, FreshnessWindow, Host, NetworkStats,
};
use dartsia_telemetry::{audit, Metrics};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ClientResult;
use crate::source::ExplorerSource;

/// Everything a dashboard render needs from one refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub hosts: Vec<Host>,
    /// Hosts within the wider listing window.
    pub listing_hosts: usize,
    /// Statistics derived locally from `hosts`.
    pub derived: NetworkStats,
    /// Statistics reported by the backend, when available.
    pub reported: Option<NetworkStats>,
    pub tip: Option<BlockSummary>,
    /// Recent block production statistics, when available.
    pub block_stats: Option<BlockStats>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditSnapshot {
    taken_at: DateTime<Utc>,
    total_hosts: u64,
    active_hosts: u64,
    listing_hosts: usize,
    median_storage_price: Decimal,
    used_storage: u64,
    total_storage: u64,
    tip_height: Option<u64>,
    hashrate: Option<Decimal>,
}

/// Fetches, normalizes and aggregates explorer records.
pub struct SnapshotProcessor {
    source: Arc<dyn ExplorerSource>,
    metrics: Metrics,
    active_window: FreshnessWindow,
    listing_window: FreshnessWindow,
    sample_output_path: Option<String>,
}

impl SnapshotProcessor {
    /// Create a new snapshot processor.
    ///
    /// # Arguments
    /// * `source` - Explorer record source
    /// * `metrics` - Metrics collector
    /// * `active_window` - Window for the "active hosts" set
    /// * `listing_window` - Window for the host listing count
    /// * `sample_output_path` - Optional path for audit samples
    pub fn new(
        source: Arc<dyn ExplorerSource>,
        metrics: Metrics,
        active_window: FreshnessWindow,
        listing_window: FreshnessWindow,
        sample_output_path: Option<String>,
    ) -> Self {
        Self {
            source,
            metrics,
            active_window,
            listing_window,
            sample_output_path,
        }
    }

    /// Run one refresh cycle.
    ///
    /// The host list is required; the tip, block stats and backend stats are
    /// optional and a failure to fetch one only leaves that part empty.
    pub async fn refresh(&self, now: DateTime<Utc>) -> ClientResult<Snapshot> {
        let raw_hosts = self.source.hosts().await?;
        let hosts = HostNormalizer::new(now, self.active_window).normalize_all(&raw_hosts);

        let tip = match self.source.tip().await {
            Ok(block) => Some(BlockSummary::from_raw(&block)),
            Err(e) => {
                warn!("Failed to fetch chain tip: {}", e);
                None
            }
        };

        let block_stats = match self.source.block_stats().await {
            Ok(stats) => Some(BlockStats::from_raw(&stats)),
            Err(e) => {
                warn!("Failed to fetch block stats: {}", e);
                None
            }
        };

        let reported = match self.source.network_stats().await {
            Ok(stats) => Some(NetworkStats::from_raw(&stats)),
            Err(e) => {
                warn!("Failed to fetch network stats: {}", e);
                None
            }
        };

        let mut derived = summarize_network(&hosts, now, self.active_window);
        if let Some(tip) = &tip {
            derived.block_height = Some(tip.height);
            derived.last_block_time = tip.timestamp;
        }
        let listing_hosts = count_by_freshness(&hosts, now, self.listing_window);

        self.metrics.inc_refreshes();
        self.metrics.inc_hosts_normalized(hosts.len() as u64);
        self.metrics.set_active_hosts(derived.active_hosts);
        if let Some(height) = derived.block_height {
            self.metrics.set_tip_height(height);
        }

        let audit_snapshot = AuditSnapshot {
            taken_at: now,
            total_hosts: derived.total_hosts,
            active_hosts: derived.active_hosts,
            listing_hosts,
            median_storage_price: derived.storage_price,
            used_storage: derived.used_storage,
            total_storage: derived.total_storage,
            tip_height: derived.block_height,
            hashrate: block_stats.as_ref().and_then(|b| b.hashrate),
        };
        if let Some(ref path) = self.sample_output_path {
            if let Err(e) = audit::append_sample(Some(path), &audit_snapshot) {
                warn!("Failed to write audit sample: {}", e);
            }
        }

        info!(
            "Refreshed {} hosts: {} active ({}h), {} listed ({}h), median price {} SC/TB/mo",
            derived.total_hosts,
            derived.active_hosts,
            self.active_window.hours(),
            listing_hosts,
            self.listing_window.hours(),
            derived.storage_price
        );

        Ok(Snapshot {
            taken_at: now,
            hosts,
            listing_hosts,
            derived,
            reported,
            tip,
            block_stats,
        })
    }
}
