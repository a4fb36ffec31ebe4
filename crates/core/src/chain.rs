//! Block and transaction summaries.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::raw::{amount_or_zero, RawAmount, RawBlock, RawBlockStats, RawTransaction};
use crate::time::parse_timestamp;
use crate::units::hastings_to_sc;

/// What a transaction does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    ContractFormation,
    ContractRevision,
    ContractResolution,
    StorageProof,
    HostAnnouncement,
    Transfer,
    /// Explicit type from the API that has no dedicated variant.
    Other(String),
}

impl TransactionKind {
    /// Map an explicit `type` string from the API.
    pub fn from_api(kind: &str) -> Self {
        let normalized = kind.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "contract_formation" | "file_contract" | "contract" => TransactionKind::ContractFormation,
            "contract_revision" | "file_contract_revision" => TransactionKind::ContractRevision,
            "contract_resolution" | "file_contract_resolution" => TransactionKind::ContractResolution,
            "storage_proof" => TransactionKind::StorageProof,
            "host_announcement" => TransactionKind::HostAnnouncement,
            "transfer" | "siacoin_transfer" => TransactionKind::Transfer,
            _ => TransactionKind::Other(kind.trim().to_string()),
        }
    }

    /// Explicit kind when given, otherwise inferred from populated sub-arrays.
    ///
    /// Inference order: resolution, revision, formation, storage proof,
    /// host announcement; a transaction with none of these is a transfer.
    pub fn of(tx: &RawTransaction) -> Self {
        if let Some(kind) = tx.kind.as_deref().filter(|k| !k.trim().is_empty()) {
            return Self::from_api(kind);
        }

        if !tx.file_contract_resolutions.is_empty() {
            TransactionKind::ContractResolution
        } else if !tx.file_contract_revisions.is_empty() {
            TransactionKind::ContractRevision
        } else if !tx.file_contracts.is_empty() {
            TransactionKind::ContractFormation
        } else if !tx.storage_proofs.is_empty() {
            TransactionKind::StorageProof
        } else if !tx.host_announcements.is_empty() {
            TransactionKind::HostAnnouncement
        } else {
            TransactionKind::Transfer
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> String {
        match self {
            TransactionKind::ContractFormation => "Contract Formation".to_string(),
            TransactionKind::ContractRevision => "Contract Revision".to_string(),
            TransactionKind::ContractResolution => "Contract Resolution".to_string(),
            TransactionKind::StorageProof => "Storage Proof".to_string(),
            TransactionKind::HostAnnouncement => "Host Announcement".to_string(),
            TransactionKind::Transfer => "Transfer".to_string(),
            TransactionKind::Other(kind) => kind.replace('_', " "),
        }
    }
}

/// Display view of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub id: String,
    pub height: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub kind: TransactionKind,
    /// Sum of siacoin outputs, in SC.
    pub output_value: Decimal,
    /// Miner fee, in SC.
    pub fee: Decimal,
    pub input_count: usize,
    pub output_count: usize,
}

/// Miner fee of a transaction in hastings.
///
/// The detail endpoint's single `minerFee` is preferred; otherwise the
/// `miner_fees` list is summed.
pub fn transaction_fee_hastings(tx: &RawTransaction) -> u128 {
    match tx.miner_fee.as_ref() {
        Some(fee) => fee.hastings(),
        None => tx
            .miner_fees
            .iter()
            .fold(0u128, |acc, fee| acc.saturating_add(fee.hastings())),
    }
}

impl TransactionSummary {
    pub fn from_raw(tx: &RawTransaction) -> Self {
        let output_hastings = tx
            .siacoin_outputs
            .iter()
            .fold(0u128, |acc, out| acc.saturating_add(amount_or_zero(out.value.as_ref())));

        Self {
            id: tx.id.clone(),
            height: tx.height,
            timestamp: parse_timestamp(tx.timestamp.as_deref()),
            kind: TransactionKind::of(tx),
            output_value: hastings_to_sc(output_hastings),
            fee: hastings_to_sc(transaction_fee_hastings(tx)),
            input_count: tx.siacoin_inputs.len(),
            output_count: tx.siacoin_outputs.len(),
        }
    }
}

/// Display view of a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    pub id: String,
    pub height: u64,
    pub parent_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub transaction_count: u64,
    /// Total miner fees, in SC.
    pub total_fees: Decimal,
    /// Total miner payout, in SC.
    pub miner_payout: Decimal,
}

impl BlockSummary {
    /// Summarize a block.
    ///
    /// Fees pre-computed by the backend are used when present and finite;
    /// otherwise they are summed from the embedded transactions.
    pub fn from_raw(block: &RawBlock) -> Self {
        let total_fees = block
            .fees
            .filter(|f| f.is_finite() && *f >= 0.0)
            .and_then(Decimal::from_f64)
            .unwrap_or_else(|| {
                let hastings = block
                    .transactions
                    .iter()
                    .fold(0u128, |acc, tx| acc.saturating_add(transaction_fee_hastings(tx)));
                hastings_to_sc(hastings)
            });

        let payout_hastings = block
            .miner_payouts
            .iter()
            .filter_map(|p| p.siacoin_output.as_ref())
            .fold(0u128, |acc, out| acc.saturating_add(amount_or_zero(out.value.as_ref())));

        Self {
            id: block.id.clone(),
            height: block.height,
            parent_id: block.parent_id.clone(),
            timestamp: parse_timestamp(block.timestamp.as_deref()),
            transaction_count: block
                .transactions_count
                .unwrap_or(block.transactions.len() as u64),
            total_fees,
            miner_payout: hastings_to_sc(payout_hastings),
        }
    }
}

/// Recent block production statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStats {
    pub latest_block: Option<u64>,
    /// Seconds.
    pub average_block_time: Option<Decimal>,
    /// SC per block.
    pub average_block_fees: Option<Decimal>,
    pub difficulty: Option<Decimal>,
    /// Hashes per second.
    pub hashrate: Option<Decimal>,
}

impl BlockStats {
    /// Canonicalize the `GET /blocks/stats` payload.
    ///
    /// A missing hashrate is estimated as difficulty over the average block
    /// time when both are known.
    pub fn from_raw(raw: &RawBlockStats) -> Self {
        let average_block_time = raw.avg_block_time.as_ref().and_then(RawAmount::decimal);
        let difficulty = raw.difficulty.as_ref().and_then(RawAmount::decimal);
        let hashrate = raw
            .hashrate
            .as_ref()
            .and_then(RawAmount::decimal)
            .filter(|h| !h.is_zero())
            .or_else(|| {
                let time = average_block_time.filter(|t| !t.is_zero())?;
                difficulty?.checked_div(time)
            })
            .map(|h| h.round_dp(0));

        Self {
            latest_block: raw.latest_block.as_ref().and_then(RawAmount::checked_count),
            average_block_time,
            average_block_fees: raw.average_block_fees.as_ref().and_then(RawAmount::decimal),
            difficulty,
            hashrate,
        }
    }
}

/// Format a hashrate with decimal unit prefixes, e.g. `1.50 TH/s`.
pub fn format_hashrate(hashes_per_second: Decimal) -> String {
    const UNITS: [&str; 7] = ["H/s", "KH/s", "MH/s", "GH/s", "TH/s", "PH/s", "EH/s"];
    let thousand = Decimal::from(1000);

    let mut value = hashes_per_second;
    let mut unit = 0;
    while value >= thousand && unit < UNITS.len() - 1 {
        value /= thousand;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Format a block interval in minutes, e.g. `9.8 min`.
pub fn format_block_time(seconds: Decimal) -> String {
    format!("{:.1} min", seconds / Decimal::from(60))
}
