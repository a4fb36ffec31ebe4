//! Network-level statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregate::{aggregate_storage, count_by_freshness, median_storage_price_within};
use crate::host::{FreshnessWindow, Host};
use crate::raw::{RawAmount, RawNetworkStats};
use crate::time::parse_timestamp;

/// Network statistics in display-ready form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub total_hosts: u64,
    pub active_hosts: u64,
    pub used_storage: u64,
    pub total_storage: u64,
    /// SC/TB/month.
    pub storage_price: Decimal,
    pub block_height: Option<u64>,
    pub last_block_time: Option<DateTime<Utc>>,
}

fn count(value: Option<&RawAmount>) -> u64 {
    value.map(RawAmount::count).unwrap_or(0)
}

/// Parse a display price, keeping fractional digits. Malformed or negative
/// input is zero.
fn price(value: Option<&RawAmount>) -> Decimal {
    value.and_then(RawAmount::decimal).unwrap_or(Decimal::ZERO)
}

impl NetworkStats {
    /// Canonicalize the `GET /network/stats` payload.
    pub fn from_raw(raw: &RawNetworkStats) -> Self {
        Self {
            total_hosts: count(raw.total_hosts.as_ref()),
            active_hosts: count(raw.active_hosts.as_ref()),
            used_storage: count(raw.used_storage.as_ref()),
            total_storage: count(raw.total_storage.as_ref()),
            storage_price: price(raw.avg_storage_price.as_ref()),
            block_height: raw.block_height.as_ref().map(RawAmount::count),
            last_block_time: parse_timestamp(raw.last_block_time.as_deref()),
        }
    }
}

/// Derive network statistics from normalized hosts.
///
/// The active count and the median price are both taken under `window`,
/// whatever window the hosts were normalized with.
///
/// # Arguments
/// * `hosts` - Normalized hosts
/// * `reference` - "Now" for the freshness check
/// * `window` - Window deciding which hosts count as active
pub fn summarize_network(
    hosts: &[Host],
    reference: DateTime<Utc>,
    window: FreshnessWindow,
) -> NetworkStats {
    let storage = aggregate_storage(hosts);

    NetworkStats {
        total_hosts: hosts.len() as u64,
        active_hosts: count_by_freshness(hosts, reference, window) as u64,
        used_storage: storage.used_bytes,
        total_storage: storage.total_bytes,
        storage_price: median_storage_price_within(hosts, reference, window),
        block_height: None,
        last_block_time: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostNormalizer;
    use crate::raw::RawHost;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_from_raw_parses_string_fields() {
        let raw: RawNetworkStats = serde_json::from_value(json!({
            "totalHosts": 812,
            "activeHosts": 301,
            "usedStorage": "4820000000000000000",
            "totalStorage": "12000000000000000000",
            "avgStoragePrice": 217.35,
            "blockHeight": 512345,
            "lastBlockTime": "2025-06-01T12:00:00Z"
        }))
        .unwrap();
        let stats = NetworkStats::from_raw(&raw);
        assert_eq!(stats.total_hosts, 812);
        assert_eq!(stats.active_hosts, 301);
        assert_eq!(stats.used_storage, 4_820_000_000_000_000_000);
        assert_eq!(stats.total_storage, 12_000_000_000_000_000_000);
        assert_eq!(stats.storage_price, Decimal::from_str("217.35").unwrap());
        assert_eq!(stats.block_height, Some(512_345));
        assert!(stats.last_block_time.is_some());
    }

    #[test]
    fn test_from_raw_defaults() {
        let raw: RawNetworkStats = serde_json::from_value(json!({
            "usedStorage": "lots",
            "avgStoragePrice": "-3"
        }))
        .unwrap();
        let stats = NetworkStats::from_raw(&raw);
        assert_eq!(stats.used_storage, 0);
        assert_eq!(stats.storage_price, Decimal::ZERO);
        assert_eq!(stats.block_height, None);
    }

    #[test]
    fn test_summarize_network() {
        let reference = DateTime::parse_from_rfc3339("2025-06-10T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let raws: Vec<RawHost> = serde_json::from_value(json!([
            {
                "publicKey": "ed25519:a",
                "lastSeen": "2025-06-09T00:00:00Z",
                "totalStorage": 4000000000000u64,
                "remainingStorage": 1000000000000u64,
                "v2Settings": { "prices": { "storagePrice": "50000000000" } }
            },
            {
                "publicKey": "ed25519:b",
                "lastSeen": "2025-05-01T00:00:00Z",
                "totalStorage": 2000000000000u64,
                "remainingStorage": 2000000000000u64
            }
        ]))
        .unwrap();
        let hosts = HostNormalizer::new(reference, FreshnessWindow::ACTIVE).normalize_all(&raws);

        let stats = summarize_network(&hosts, reference, FreshnessWindow::ACTIVE);
        assert_eq!(stats.total_hosts, 2);
        assert_eq!(stats.active_hosts, 1);
        assert_eq!(stats.total_storage, 6_000_000_000_000);
        assert_eq!(stats.used_storage, 3_000_000_000_000);
        assert_eq!(stats.storage_price, Decimal::from(216));
    }

    #[test]
    fn test_summary_uses_one_window_throughout() {
        let reference = DateTime::parse_from_rfc3339("2025-06-10T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let raws: Vec<RawHost> = serde_json::from_value(json!([
            {
                "publicKey": "ed25519:a",
                "lastSeen": "2025-06-09T12:00:00Z",
                "settings": { "storageprice": "10000000000" }
            },
            {
                "publicKey": "ed25519:b",
                "lastSeen": "2025-06-06T00:00:00Z",
                "settings": { "storageprice": "30000000000" }
            }
        ]))
        .unwrap();
        // normalized under the 48h window: only "a" is flagged active
        let hosts = HostNormalizer::new(reference, FreshnessWindow::ACTIVE).normalize_all(&raws);
        assert_eq!(hosts.iter().filter(|h| h.is_active).count(), 1);

        let listing = summarize_network(&hosts, reference, FreshnessWindow::LISTING);
        assert_eq!(listing.active_hosts, 2);
        // (43.2 + 129.6) / 2
        assert_eq!(listing.storage_price, Decimal::from_str("86.4").unwrap());

        let active = summarize_network(&hosts, reference, FreshnessWindow::ACTIVE);
        assert_eq!(active.active_hosts, 1);
        assert_eq!(active.storage_price, Decimal::from_str("43.2").unwrap());
    }
}
