//! Raw API record schemas.
//!
//! Field names match what the explorer backend emits. Deserialization is
//! lenient: numeric fields accept either a JSON string or a number, and a
//! nested block of the wrong shape is dropped instead of failing the record.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::units;

/// A raw amount or count as sent by the API, kept in its decimal-string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawAmount(String);

impl RawAmount {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value in the smallest unit; malformed input is zero.
    pub fn hastings(&self) -> u128 {
        units::parse_hastings(&self.0)
    }

    /// Value as a count, saturating at `u64::MAX`.
    pub fn count(&self) -> u64 {
        u64::try_from(self.hastings()).unwrap_or(u64::MAX)
    }

    /// Value as a display decimal, keeping fractional digits.
    ///
    /// `None` for non-numeric, negative or out-of-range input.
    pub fn decimal(&self) -> Option<Decimal> {
        let trimmed = self.0.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .ok()
            .filter(|d| !d.is_sign_negative())
    }

    /// Value as a count, or `None` when the text is not a number at all.
    pub fn checked_count(&self) -> Option<u64> {
        let trimmed = self.0.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<u64>().ok().or_else(|| match self.hastings() {
            0 => None,
            value => Some(u64::try_from(value).unwrap_or(u64::MAX)),
        })
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for RawAmount {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => RawAmount(s),
            Value::Number(n) => RawAmount(n.to_string()),
            other => {
                debug!("Ignoring non-numeric amount {}", other);
                RawAmount::default()
            }
        })
    }
}

/// Amount of an optional field, zero when absent.
pub fn amount_or_zero(value: Option<&RawAmount>) -> u128 {
    value.map(RawAmount::hastings).unwrap_or(0)
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            debug!("Dropping malformed field: {}", e);
            Ok(None)
        }
    }
}

/// Array of records where each malformed entry is dropped on its own.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        other => {
            debug!("Dropping {} where an array was expected", json_kind(&other));
            return Ok(Vec::new());
        }
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Dropping malformed entry: {}", e);
                None
            }
        })
        .collect())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, String>(deserializer)?.unwrap_or_default())
}

/// Count sent as a number or a numeric string; anything else is zero.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawAmount::deserialize(deserializer)?.count())
}

/// Optional count sent as a number or a numeric string.
fn lenient_count_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawAmount>::deserialize(deserializer)?.and_then(|a| a.checked_count()))
}

/// Host record from `GET /hosts`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHost {
    #[serde(default, deserialize_with = "lenient")]
    pub public_key: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub net_address: Option<String>,
    #[serde(default)]
    pub total_storage: Option<RawAmount>,
    #[serde(default)]
    pub remaining_storage: Option<RawAmount>,
    #[serde(default, deserialize_with = "lenient")]
    pub accepting_contracts: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_scan: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_seen: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_scan_successful: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub settings: Option<LegacySettings>,
    #[serde(default, deserialize_with = "lenient")]
    pub v2_settings: Option<CurrentSettings>,
}

/// Legacy flat settings block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacySettings {
    #[serde(default, rename = "totalstorage")]
    pub total_storage: Option<RawAmount>,
    #[serde(default, rename = "remainingstorage")]
    pub remaining_storage: Option<RawAmount>,
    #[serde(default, rename = "storageprice")]
    pub storage_price: Option<RawAmount>,
    #[serde(default, rename = "uploadbandwidthprice")]
    pub upload_bandwidth_price: Option<RawAmount>,
    #[serde(default, rename = "downloadbandwidthprice")]
    pub download_bandwidth_price: Option<RawAmount>,
    #[serde(default, rename = "contractprice")]
    pub contract_price: Option<RawAmount>,
    #[serde(default, deserialize_with = "lenient")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub release: Option<String>,
}

/// Current-generation settings block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSettings {
    #[serde(default, deserialize_with = "lenient")]
    pub prices: Option<CurrentPrices>,
    #[serde(default)]
    pub total_storage: Option<RawAmount>,
    #[serde(default)]
    pub remaining_storage: Option<RawAmount>,
    #[serde(default, deserialize_with = "lenient")]
    pub accepting_contracts: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub release: Option<String>,
}

/// Current-generation price table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPrices {
    #[serde(default)]
    pub storage_price: Option<RawAmount>,
    #[serde(default)]
    pub ingress_price: Option<RawAmount>,
    #[serde(default)]
    pub egress_price: Option<RawAmount>,
    #[serde(default)]
    pub contract_price: Option<RawAmount>,
}

/// Decode a `GET /hosts` payload.
///
/// Entries that are not JSON objects are skipped so one bad record cannot
/// hide the rest of the collection.
pub fn parse_hosts(payload: Value) -> Vec<RawHost> {
    parse_collection(payload, "host")
}

/// Decode a `GET /blocks` payload, skipping malformed entries.
pub fn parse_blocks(payload: Value) -> Vec<RawBlock> {
    parse_collection(payload, "block")
}

/// Decode a `GET /tx/recent` payload, skipping malformed entries.
pub fn parse_transactions(payload: Value) -> Vec<RawTransaction> {
    parse_collection(payload, "transaction")
}

fn parse_collection<T: DeserializeOwned>(payload: Value, what: &str) -> Vec<T> {
    let entries = match payload {
        Value::Array(entries) => entries,
        other => {
            warn!("Expected an array of {} records, got {}", what, json_kind(&other));
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<T>(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping {} record {}: {}", what, index, e);
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Siacoin output as embedded in blocks and transactions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSiacoinOutput {
    #[serde(default)]
    pub value: Option<RawAmount>,
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<String>,
}

/// Miner payout wrapper used by blocks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMinerPayout {
    #[serde(default, deserialize_with = "lenient")]
    pub siacoin_output: Option<RawSiacoinOutput>,
}

/// Transaction record from `GET /tx/:id`, `GET /tx/recent` and block bodies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransaction {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_count_opt")]
    pub height: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, alias = "siacoinInputs", deserialize_with = "lenient_vec")]
    pub siacoin_inputs: Vec<Value>,
    #[serde(default, alias = "siacoinOutputs", deserialize_with = "lenient_vec")]
    pub siacoin_outputs: Vec<RawSiacoinOutput>,
    #[serde(default, alias = "fileContracts", deserialize_with = "lenient_vec")]
    pub file_contracts: Vec<Value>,
    #[serde(default, alias = "fileContractRevisions", deserialize_with = "lenient_vec")]
    pub file_contract_revisions: Vec<Value>,
    #[serde(default, alias = "fileContractResolutions", deserialize_with = "lenient_vec")]
    pub file_contract_resolutions: Vec<Value>,
    #[serde(default, alias = "storageProofs", deserialize_with = "lenient_vec")]
    pub storage_proofs: Vec<Value>,
    #[serde(default, alias = "hostAnnouncements", deserialize_with = "lenient_vec")]
    pub host_announcements: Vec<Value>,
    #[serde(default, alias = "minerFees", deserialize_with = "lenient_vec")]
    pub miner_fees: Vec<RawAmount>,
    /// Single fee sent by the detail endpoint.
    #[serde(default, rename = "minerFee")]
    pub miner_fee: Option<RawAmount>,
    #[serde(default, alias = "arbitraryData", deserialize_with = "lenient_vec")]
    pub arbitrary_data: Vec<Value>,
}

/// Block record from `GET /blocks`, `GET /blocks/:id` and `GET /blocks/tip`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBlock {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub height: u64,
    #[serde(default, alias = "parentID", alias = "parentId", deserialize_with = "lenient")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub transactions: Vec<RawTransaction>,
    #[serde(default, rename = "transactionsCount", deserialize_with = "lenient_count_opt")]
    pub transactions_count: Option<u64>,
    /// Fees pre-computed by the backend, already in SC.
    #[serde(default, deserialize_with = "lenient")]
    pub fees: Option<f64>,
    #[serde(default, alias = "minerPayouts", deserialize_with = "lenient_vec")]
    pub miner_payouts: Vec<RawMinerPayout>,
}

/// Payload of `GET /blocks/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlockStats {
    #[serde(default)]
    pub latest_block: Option<RawAmount>,
    /// Seconds between recent blocks.
    #[serde(default, alias = "averageBlockTime")]
    pub avg_block_time: Option<RawAmount>,
    /// Mean fees per recent block, already in SC.
    #[serde(default, alias = "avgBlockFees")]
    pub average_block_fees: Option<RawAmount>,
    #[serde(default)]
    pub difficulty: Option<RawAmount>,
    /// Hashes per second.
    #[serde(default)]
    pub hashrate: Option<RawAmount>,
}

/// Payload of `GET /network/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNetworkStats {
    #[serde(default)]
    pub total_hosts: Option<RawAmount>,
    #[serde(default)]
    pub active_hosts: Option<RawAmount>,
    #[serde(default)]
    pub used_storage: Option<RawAmount>,
    #[serde(default)]
    pub total_storage: Option<RawAmount>,
    #[serde(default)]
    pub avg_storage_price: Option<RawAmount>,
    #[serde(default)]
    pub block_height: Option<RawAmount>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_block_time: Option<String>,
}
