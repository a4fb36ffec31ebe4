//! Storage capacity reconciliation.
//!
//! Some host records report `totalStorage`/`remainingStorage` as a count of
//! 4 MiB sectors rather than bytes, and nothing in the record says which.
//! Any total below [`SECTOR_COUNT_THRESHOLD`] is taken to be a sector count.
//! This is a fallback policy, not a protocol guarantee: a genuine host with
//! less than 100 GiB of byte-encoded capacity will be over-reported.

use serde::Serialize;

/// Size of one storage sector in bytes.
pub const SECTOR_SIZE: u64 = 4_194_304;

/// Totals strictly below this value (100 GiB) are read as sector counts.
pub const SECTOR_COUNT_THRESHOLD: u64 = 100 * 1024 * 1024 * 1024;

/// Encoding inferred for a host's storage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEncoding {
    Bytes,
    Sectors,
}

impl StorageEncoding {
    /// Infer the encoding from the reported total.
    pub fn detect(total: u64) -> Self {
        if total > 0 && total < SECTOR_COUNT_THRESHOLD {
            StorageEncoding::Sectors
        } else {
            StorageEncoding::Bytes
        }
    }

    fn to_bytes(self, value: u64) -> u64 {
        match self {
            StorageEncoding::Bytes => value,
            StorageEncoding::Sectors => value.saturating_mul(SECTOR_SIZE),
        }
    }
}

/// Byte-denominated capacity of a single host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

/// Reconcile reported total/remaining counters into byte totals.
///
/// # Arguments
/// * `total` - Reported total storage, bytes or sectors
/// * `remaining` - Reported remaining storage, same encoding as `total`
///
/// # Returns
/// Usage with `used_bytes <= total_bytes`; a remaining value that exceeds
/// the total (reporting lag) clamps used storage to zero.
pub fn reconcile(total: u64, remaining: u64) -> StorageUsage {
    let encoding = StorageEncoding::detect(total);
    let total_bytes = encoding.to_bytes(total);
    let remaining_bytes = encoding.to_bytes(remaining);

    let used_bytes = total_bytes.saturating_sub(remaining_bytes);

    StorageUsage {
        total_bytes,
        used_bytes,
        free_bytes: total_bytes - used_bytes,
    }
}

/// Format a byte count with decimal units, e.g. `4.82 PB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 1000 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
