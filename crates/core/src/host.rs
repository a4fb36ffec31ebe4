//! Host normalization.
//!
//! Maps a [`RawHost`] of either settings generation onto one canonical
//! [`Host`]. Values from the current generation (`v2Settings`, plus the
//! top-level storage counters) win whenever they are present and non-zero;
//! the legacy flat `settings` block is the fallback; zero is the default.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::raw::{amount_or_zero, RawAmount, RawHost};
use crate::storage::{self, StorageUsage};
use crate::time::parse_seen_timestamp;
use crate::units::{self, ProtocolGeneration};

/// Country code used when a host's region is unknown.
pub const UNKNOWN_REGION: &str = "XX";

/// Maximum time since a host was last seen for it to count as fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FreshnessWindow {
    hours: u32,
}

impl FreshnessWindow {
    /// Window behind the primary "active hosts" set.
    pub const ACTIVE: Self = Self::from_hours(48);
    /// Wider window used by the host listing.
    pub const LISTING: Self = Self::from_hours(24 * 7);

    pub const fn from_hours(hours: u32) -> Self {
        Self { hours }
    }

    pub fn hours(self) -> u32 {
        self.hours
    }

    /// Whether `last_seen` falls within the window ending at `reference`.
    ///
    /// A host that was never seen is never fresh.
    pub fn contains(self, reference: DateTime<Utc>, last_seen: Option<DateTime<Utc>>) -> bool {
        match last_seen {
            Some(seen) => reference.signed_duration_since(seen) <= Duration::hours(i64::from(self.hours)),
            None => false,
        }
    }
}

impl Default for FreshnessWindow {
    fn default() -> Self {
        Self::ACTIVE
    }
}

/// Canonical host view model.
///
/// Every price is in SC: storage per TB per month, bandwidth per TB, and the
/// contract price as a flat amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub id: String,
    pub address: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    #[serde(rename = "storagePricePerTBMonth")]
    pub storage_price_per_tb_month: Decimal,
    pub contract_price: Decimal,
    #[serde(rename = "downloadPricePerTB")]
    pub download_price_per_tb: Decimal,
    #[serde(rename = "uploadPricePerTB")]
    pub upload_price_per_tb: Decimal,
    pub reliability_score: u8,
    pub version: String,
    pub region: String,
    pub accepting_contracts: bool,
    pub online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Host {
    pub fn storage(&self) -> StorageUsage {
        StorageUsage {
            total_bytes: self.total_bytes,
            used_bytes: self.used_bytes,
            free_bytes: self.free_bytes,
        }
    }

    /// Re-evaluate freshness under another window.
    pub fn is_fresh(&self, reference: DateTime<Utc>, window: FreshnessWindow) -> bool {
        window.contains(reference, self.last_seen)
    }
}

/// Resolve a price field across both generations.
///
/// # Returns
/// The current-generation value when it parses to a non-zero amount,
/// otherwise the legacy value (zero when absent), tagged with its origin.
pub fn resolve_amount(
    current: Option<&RawAmount>,
    legacy: Option<&RawAmount>,
) -> (u128, ProtocolGeneration) {
    let current_value = amount_or_zero(current);
    if current_value > 0 {
        (current_value, ProtocolGeneration::Current)
    } else {
        (amount_or_zero(legacy), ProtocolGeneration::Legacy)
    }
}

/// Total/remaining counters from the first source reporting a non-zero total.
///
/// Sources are tried in order: top-level fields, `v2Settings`, `settings`.
/// Both counters are taken from the same source.
fn storage_counters(raw: &RawHost) -> (u64, u64) {
    let current = raw.v2_settings.as_ref();
    let legacy = raw.settings.as_ref();

    let sources = [
        (raw.total_storage.as_ref(), raw.remaining_storage.as_ref()),
        (
            current.and_then(|s| s.total_storage.as_ref()),
            current.and_then(|s| s.remaining_storage.as_ref()),
        ),
        (
            legacy.and_then(|s| s.total_storage.as_ref()),
            legacy.and_then(|s| s.remaining_storage.as_ref()),
        ),
    ];

    sources
        .into_iter()
        .map(|(total, remaining)| {
            (
                total.map(RawAmount::count).unwrap_or(0),
                remaining.map(RawAmount::count).unwrap_or(0),
            )
        })
        .find(|(total, _)| *total > 0)
        .unwrap_or((0, 0))
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn resolve_version(raw: &RawHost) -> String {
    let current = raw.v2_settings.as_ref();
    let legacy = raw.settings.as_ref();

    non_empty(current.and_then(|s| s.release.as_ref()))
        .or_else(|| non_empty(legacy.and_then(|s| s.version.as_ref())))
        .or_else(|| non_empty(legacy.and_then(|s| s.release.as_ref())))
        .unwrap_or_default()
        .to_string()
}

fn resolve_region(raw: &RawHost) -> String {
    non_empty(raw.country_code.as_ref())
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| UNKNOWN_REGION.to_string())
}

/// Map a 0..1 score onto a 0..100 integer.
fn reliability_score(score: Option<f64>) -> u8 {
    match score {
        Some(s) if s.is_finite() => (s * 100.0).clamp(0.0, 100.0).round() as u8,
        _ => 0,
    }
}

/// Instant a host was last seen.
///
/// `lastSeen` is authoritative when present; `lastScan` is only consulted
/// when `lastSeen` is missing altogether. Zero-time sentinels yield `None`.
pub fn last_seen(raw: &RawHost) -> Option<DateTime<Utc>> {
    match raw.last_seen.as_deref() {
        Some(seen) => parse_seen_timestamp(Some(seen)),
        None => parse_seen_timestamp(raw.last_scan.as_deref()),
    }
}

/// Whether a raw host was seen within `window` of `reference`.
pub fn is_active(raw: &RawHost, reference: DateTime<Utc>, window: FreshnessWindow) -> bool {
    window.contains(reference, last_seen(raw))
}

/// Normalizes raw hosts against a fixed reference time and freshness window.
#[derive(Debug, Clone, Copy)]
pub struct HostNormalizer {
    reference_time: DateTime<Utc>,
    window: FreshnessWindow,
}

impl HostNormalizer {
    /// Create a normalizer.
    ///
    /// # Arguments
    /// * `reference_time` - "Now" for freshness checks
    /// * `window` - Window that decides `Host::is_active`
    pub fn new(reference_time: DateTime<Utc>, window: FreshnessWindow) -> Self {
        Self {
            reference_time,
            window,
        }
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    pub fn window(&self) -> FreshnessWindow {
        self.window
    }

    /// Normalize one raw host. Never fails; unknown shapes produce zeros.
    pub fn normalize(&self, raw: &RawHost) -> Host {
        let id = raw.public_key.clone().unwrap_or_default();

        if raw.settings.is_none() && raw.v2_settings.is_none() {
            debug!("Host {} has no settings block, deriving defaults", id);
        }

        let (total, remaining) = storage_counters(raw);
        let usage = storage::reconcile(total, remaining);

        let prices = raw.v2_settings.as_ref().and_then(|s| s.prices.as_ref());
        let legacy = raw.settings.as_ref();

        let (storage_price, generation) = resolve_amount(
            prices.and_then(|p| p.storage_price.as_ref()),
            legacy.and_then(|s| s.storage_price.as_ref()),
        );
        let (ingress_price, _) = resolve_amount(
            prices.and_then(|p| p.ingress_price.as_ref()),
            legacy.and_then(|s| s.upload_bandwidth_price.as_ref()),
        );
        let (egress_price, _) = resolve_amount(
            prices.and_then(|p| p.egress_price.as_ref()),
            legacy.and_then(|s| s.download_bandwidth_price.as_ref()),
        );
        let (contract_price, _) = resolve_amount(
            prices.and_then(|p| p.contract_price.as_ref()),
            legacy.and_then(|s| s.contract_price.as_ref()),
        );

        let accepting_contracts = raw
            .accepting_contracts
            .or_else(|| raw.v2_settings.as_ref().and_then(|s| s.accepting_contracts))
            .unwrap_or(false);

        let last_seen = last_seen(raw);

        Host {
            address: raw.net_address.clone().unwrap_or_default(),
            total_bytes: usage.total_bytes,
            used_bytes: usage.used_bytes,
            free_bytes: usage.free_bytes,
            storage_price_per_tb_month: units::storage_price_from_hastings(storage_price, generation),
            contract_price: units::hastings_to_sc(contract_price),
            download_price_per_tb: units::bandwidth_price_from_hastings(egress_price),
            upload_price_per_tb: units::bandwidth_price_from_hastings(ingress_price),
            reliability_score: reliability_score(raw.score),
            version: resolve_version(raw),
            region: resolve_region(raw),
            accepting_contracts,
            online: raw.last_scan_successful.unwrap_or(false),
            last_seen,
            is_active: self.window.contains(self.reference_time, last_seen),
            id,
        }
    }

    pub fn normalize_all(&self, raws: &[RawHost]) -> Vec<Host> {
        raws.iter().map(|raw| self.normalize(raw)).collect()
    }
}

/// Normalize a single host; see [`HostNormalizer::normalize`].
pub fn normalize(raw: &RawHost, reference_time: DateTime<Utc>, window: FreshnessWindow) -> Host {
    HostNormalizer::new(reference_time, window).normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SECTOR_SIZE;
    use serde_json::{json, Value};
    use std::str::FromStr;

    fn reference() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-10T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn raw(value: Value) -> RawHost {
        serde_json::from_value(value).unwrap()
    }

    fn legacy_host() -> RawHost {
        raw(json!({
            "publicKey": "ed25519:aaaa",
            "netAddress": "host.example.com:9982",
            "lastSeen": "2025-06-09T12:00:00Z",
            "countryCode": "de",
            "score": 0.87,
            "settings": {
                "totalstorage": 8_000_000_000_000u64,
                "remainingstorage": 2_000_000_000_000u64,
                "storageprice": "50000000000",
                "uploadbandwidthprice": "1000000000000",
                "downloadbandwidthprice": "3000000000000",
                "contractprice": "200000000000000000000000",
                "version": "1.5.9"
            }
        }))
    }

    fn current_host() -> RawHost {
        raw(json!({
            "publicKey": "ed25519:aaaa",
            "netAddress": "host.example.com:9982",
            "lastSeen": "2025-06-09T12:00:00Z",
            "countryCode": "de",
            "score": 0.87,
            "totalStorage": 8_000_000_000_000u64,
            "remainingStorage": 2_000_000_000_000u64,
            "settings": { "version": "1.5.9" },
            "v2Settings": {
                "prices": {
                    "storagePrice": "50000000000",
                    "ingressPrice": "1000000000000",
                    "egressPrice": "3000000000000",
                    "contractPrice": "200000000000000000000000"
                }
            }
        }))
    }

    #[test]
    fn test_normalize_legacy_host() {
        let host = normalize(&legacy_host(), reference(), FreshnessWindow::ACTIVE);
        assert_eq!(host.id, "ed25519:aaaa");
        assert_eq!(host.address, "host.example.com:9982");
        assert_eq!(host.total_bytes, 8_000_000_000_000);
        assert_eq!(host.used_bytes, 6_000_000_000_000);
        assert_eq!(host.free_bytes, 2_000_000_000_000);
        assert_eq!(host.storage_price_per_tb_month, Decimal::from(216));
        assert_eq!(host.upload_price_per_tb, Decimal::ONE);
        assert_eq!(host.download_price_per_tb, Decimal::from(3));
        assert_eq!(host.contract_price, Decimal::from_str("0.2").unwrap());
        assert_eq!(host.reliability_score, 87);
        assert_eq!(host.version, "1.5.9");
        assert_eq!(host.region, "DE");
        assert!(host.is_active);
    }

    #[test]
    fn test_generations_with_equal_values_agree() {
        let reference = reference();
        assert_eq!(
            normalize(&legacy_host(), reference, FreshnessWindow::ACTIVE),
            normalize(&current_host(), reference, FreshnessWindow::ACTIVE)
        );
    }

    #[test]
    fn test_current_generation_wins() {
        let host = raw(json!({
            "publicKey": "ed25519:bb",
            "settings": { "storageprice": "10000000000" },
            "v2Settings": { "prices": { "storagePrice": "50000000000" } }
        }));
        let host = normalize(&host, reference(), FreshnessWindow::ACTIVE);
        assert_eq!(host.storage_price_per_tb_month, Decimal::from(216));
    }

    #[test]
    fn test_zero_current_value_falls_back_to_legacy() {
        let host = raw(json!({
            "publicKey": "ed25519:bb",
            "settings": { "storageprice": "50000000000" },
            "v2Settings": { "prices": { "storagePrice": "0" } }
        }));
        let host = normalize(&host, reference(), FreshnessWindow::ACTIVE);
        assert_eq!(host.storage_price_per_tb_month, Decimal::from(216));
    }

    #[test]
    fn test_resolve_amount_reports_origin() {
        let current = RawAmount::from("7");
        let legacy = RawAmount::from("9");
        assert_eq!(
            resolve_amount(Some(&current), Some(&legacy)),
            (7, ProtocolGeneration::Current)
        );
        assert_eq!(
            resolve_amount(None, Some(&legacy)),
            (9, ProtocolGeneration::Legacy)
        );
        assert_eq!(resolve_amount(None, None), (0, ProtocolGeneration::Legacy));
    }

    #[test]
    fn test_sector_encoded_storage() {
        let host = raw(json!({
            "publicKey": "ed25519:cc",
            "v2Settings": { "totalStorage": 1000, "remainingStorage": 200 }
        }));
        let host = normalize(&host, reference(), FreshnessWindow::ACTIVE);
        assert_eq!(host.total_bytes, 1000 * SECTOR_SIZE);
        assert_eq!(host.used_bytes, 800 * SECTOR_SIZE);
    }

    #[test]
    fn test_used_never_exceeds_total() {
        let cases = [
            json!({ "totalStorage": 1000, "remainingStorage": 5000 }),
            json!({ "totalStorage": "5000000000000", "remainingStorage": "-1" }),
            json!({ "totalStorage": 0, "remainingStorage": 10 }),
            json!({ "totalStorage": "junk", "remainingStorage": "junk" }),
            json!({ "settings": { "totalstorage": 18446744073709551615u64, "remainingstorage": 0 } }),
            json!({}),
        ];
        for case in cases {
            let host = normalize(&raw(case), reference(), FreshnessWindow::ACTIVE);
            assert!(host.used_bytes <= host.total_bytes);
            assert_eq!(host.used_bytes + host.free_bytes, host.total_bytes);
        }
    }

    #[test]
    fn test_unknown_shape_yields_defaults() {
        let host = normalize(
            &raw(json!({ "publicKey": "ed25519:dd" })),
            reference(),
            FreshnessWindow::ACTIVE,
        );
        assert_eq!(host.total_bytes, 0);
        assert_eq!(host.storage_price_per_tb_month, Decimal::ZERO);
        assert_eq!(host.contract_price, Decimal::ZERO);
        assert_eq!(host.version, "");
        assert_eq!(host.region, UNKNOWN_REGION);
        assert!(!host.is_active);
        assert!(!host.accepting_contracts);
    }

    #[test]
    fn test_epoch_sentinel_is_never_active() {
        for sentinel in ["1970-01-01T00:00:00Z", "0001-01-01T00:00:00Z"] {
            let host = raw(json!({ "publicKey": "ed25519:ee", "lastSeen": sentinel }));
            assert!(!is_active(&host, reference(), FreshnessWindow::ACTIVE));
            assert!(!is_active(&host, reference(), FreshnessWindow::LISTING));
            assert!(!is_active(&host, reference(), FreshnessWindow::from_hours(u32::MAX)));
        }
    }

    #[test]
    fn test_windows_are_independent() {
        // three days before the reference time
        let host = raw(json!({ "publicKey": "ed25519:ff", "lastSeen": "2025-06-07T00:00:00Z" }));
        assert!(!is_active(&host, reference(), FreshnessWindow::ACTIVE));
        assert!(is_active(&host, reference(), FreshnessWindow::LISTING));

        let boundary = raw(json!({ "publicKey": "ed25519:ff", "lastSeen": "2025-06-08T00:00:00Z" }));
        assert!(is_active(&boundary, reference(), FreshnessWindow::ACTIVE));
    }

    #[test]
    fn test_last_scan_is_fallback_only() {
        let scanned = raw(json!({ "lastScan": "2025-06-09T00:00:00Z" }));
        assert!(is_active(&scanned, reference(), FreshnessWindow::ACTIVE));

        let sentinel_seen = raw(json!({
            "lastSeen": "0001-01-01T00:00:00Z",
            "lastScan": "2025-06-09T00:00:00Z"
        }));
        assert!(!is_active(&sentinel_seen, reference(), FreshnessWindow::ACTIVE));
    }

    #[test]
    fn test_reliability_score_is_clamped() {
        assert_eq!(reliability_score(None), 0);
        assert_eq!(reliability_score(Some(f64::NAN)), 0);
        assert_eq!(reliability_score(Some(-0.5)), 0);
        assert_eq!(reliability_score(Some(1.7)), 100);
        assert_eq!(reliability_score(Some(0.994)), 99);
    }

    #[test]
    fn test_version_precedence() {
        let host = raw(json!({
            "settings": { "release": "hostd v1.0.0" },
            "v2Settings": { "release": "hostd v2.1.0" }
        }));
        assert_eq!(resolve_version(&host), "hostd v2.1.0");

        let legacy_release = raw(json!({ "settings": { "version": "", "release": "siad 1.5.9" } }));
        assert_eq!(resolve_version(&legacy_release), "siad 1.5.9");
    }
}
