//! Network-wide aggregates over normalized hosts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::host::{FreshnessWindow, Host};

/// Summed capacity of a host collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageTotals {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

/// Median storage price (SC/TB/month) across active hosts.
///
/// Returns zero when no host is active. Even-sized sets average the two
/// middle prices.
pub fn median_storage_price(hosts: &[Host]) -> Decimal {
    median(hosts.iter().filter(|h| h.is_active))
}

/// Median storage price across hosts seen within `window` of `reference`.
///
/// Unlike [`median_storage_price`] this ignores the `is_active` flag set at
/// normalization time, so the price and the active count of one summary are
/// always taken under the same window.
pub fn median_storage_price_within(
    hosts: &[Host],
    reference: DateTime<Utc>,
    window: FreshnessWindow,
) -> Decimal {
    median(hosts.iter().filter(|h| h.is_fresh(reference, window)))
}

fn median<'a>(hosts: impl Iterator<Item = &'a Host>) -> Decimal {
    let mut prices: Vec<Decimal> = hosts.map(|h| h.storage_price_per_tb_month).collect();

    if prices.is_empty() {
        return Decimal::ZERO;
    }

    // stable sort, equal prices keep input order
    prices.sort();
    let mid = prices.len() / 2;
    if prices.len() % 2 == 0 {
        midpoint(prices[mid - 1], prices[mid])
    } else {
        prices[mid]
    }
}

/// Mean of two sorted prices without overflowing near `Decimal::MAX`.
fn midpoint(lo: Decimal, hi: Decimal) -> Decimal {
    if lo == hi {
        return lo;
    }
    let two = Decimal::from(2);
    lo.checked_add(hi)
        .map(|sum| sum / two)
        .or_else(|| (lo / two).checked_add(hi / two))
        .unwrap_or(hi)
        .normalize()
}

/// Sum capacity over every host, active or not.
pub fn aggregate_storage(hosts: &[Host]) -> StorageTotals {
    hosts.iter().fold(StorageTotals::default(), |acc, h| StorageTotals {
        total_bytes: acc.total_bytes.saturating_add(h.total_bytes),
        used_bytes: acc.used_bytes.saturating_add(h.used_bytes),
    })
}

/// Count hosts seen within `window` of `reference`.
///
/// # Arguments
/// * `hosts` - Normalized hosts
/// * `reference` - "Now" for the freshness check
/// * `window` - Freshness window to apply
pub fn count_by_freshness(
    hosts: &[Host],
    reference: DateTime<Utc>,
    window: FreshnessWindow,
) -> usize {
    hosts
        .iter()
        .filter(|h| h.is_fresh(reference, window))
        .count()
}
