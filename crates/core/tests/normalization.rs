//! End-to-end tests from raw API payloads to display aggregates.

use chrono::{DateTime, Utc};
use dartsia_core::host::HostNormalizer;
use dartsia_core::network::summarize_network;
use dartsia_core::raw::parse_hosts;
use dartsia_core::storage::SECTOR_SIZE;
use dartsia_core::units;
use dartsia_core::{classify, median_storage_price, FreshnessWindow, QueryKind};
use rust_decimal::Decimal;
use serde_json::json;

fn reference() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-10T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn test_mixed_generation_payload() {
    let payload = json!([
        {
            "publicKey": "ed25519:1111",
            "netAddress": "one.example.com:9982",
            "lastSeen": "2025-06-09T20:00:00Z",
            "countryCode": "US",
            "settings": {
                "totalstorage": 1000,
                "remainingstorage": 250,
                "storageprice": "20000000000",
                "contractprice": "100000000000000000000000"
            }
        },
        {
            "publicKey": "ed25519:2222",
            "netAddress": "two.example.com:9984",
            "lastSeen": "2025-06-09T00:00:00Z",
            "totalStorage": "16000000000000",
            "remainingStorage": "4000000000000",
            "v2Settings": {
                "prices": {
                    "storagePrice": "60000000000",
                    "ingressPrice": "500000000000",
                    "egressPrice": "2000000000000"
                },
                "acceptingContracts": true
            }
        },
        "not a host",
        {
            "publicKey": "ed25519:3333",
            "lastSeen": "0001-01-01T00:00:00Z",
            "settings": { "storageprice": "999999999999999" }
        }
    ]);

    let raws = parse_hosts(payload);
    assert_eq!(raws.len(), 3);

    let hosts = HostNormalizer::new(reference(), FreshnessWindow::ACTIVE).normalize_all(&raws);

    let sector_host = &hosts[0];
    assert_eq!(sector_host.total_bytes, 1000 * SECTOR_SIZE);
    assert_eq!(sector_host.used_bytes, 750 * SECTOR_SIZE);
    assert_eq!(sector_host.region, "US");

    let current_host = &hosts[1];
    assert!(current_host.accepting_contracts);
    assert_eq!(current_host.region, "XX");
    assert_eq!(current_host.upload_price_per_tb, Decimal::new(5, 1));
    assert_eq!(current_host.download_price_per_tb, Decimal::from(2));

    let never_seen = &hosts[2];
    assert!(!never_seen.is_active);

    for host in &hosts {
        assert!(host.used_bytes <= host.total_bytes);
    }

    // 2e10 -> 86.4, 6e10 -> 259.2; the never-seen host is excluded
    assert_eq!(
        median_storage_price(&hosts),
        (units::storage_price_to_display("20000000000")
            + units::storage_price_to_display("60000000000"))
            / Decimal::from(2)
    );

    let stats = summarize_network(&hosts, reference(), FreshnessWindow::ACTIVE);
    assert_eq!(stats.total_hosts, 3);
    assert_eq!(stats.active_hosts, 2);
    assert_eq!(
        stats.total_storage,
        1000 * SECTOR_SIZE + 16_000_000_000_000
    );
}

#[test]
fn test_prices_share_one_display_unit() {
    let legacy = json!([{
        "publicKey": "ed25519:a",
        "settings": { "storageprice": "50000000000" }
    }]);
    let current = json!([{
        "publicKey": "ed25519:a",
        "v2Settings": { "prices": { "storagePrice": "50000000000" } }
    }]);

    let normalizer = HostNormalizer::new(reference(), FreshnessWindow::LISTING);
    let a = normalizer.normalize_all(&parse_hosts(legacy));
    let b = normalizer.normalize_all(&parse_hosts(current));
    assert_eq!(a[0].storage_price_per_tb_month, b[0].storage_price_per_tb_month);
}

#[test]
fn test_search_query_classification() {
    assert_eq!(classify("234567"), QueryKind::BlockHeight);
    assert_eq!(classify(""), QueryKind::Unknown);
    assert_eq!(classify("ed25519:abcd"), QueryKind::HostKey);
    assert_eq!(classify(&"0123456789abcdef".repeat(4)), QueryKind::Hash);
    assert_eq!(classify(&"ab".repeat(25)), QueryKind::Address);
}
