//! Conversions from raw on-chain amounts to display units.
//!
//! Amounts arrive as decimal strings of hastings, the indivisible currency
//! unit (10^24 hastings = 1 SC). They are parsed as `u128` integers and scaled
//! into `Decimal` exactly, so no precision is lost on the way to display.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

/// Hastings per siacoin.
pub const HASTINGS_PER_SC: u128 = 1_000_000_000_000_000_000_000_000;

/// Decimal scale of one hasting expressed in SC.
const SC_SCALE: u32 = 24;

/// Blocks per 30-day month at the target 10 minute block time.
pub const BLOCKS_PER_MONTH: u64 = 4320;

/// Bytes per (decimal) terabyte.
pub const BYTES_PER_TB: u64 = 1_000_000_000_000;

/// Host settings generation a price was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolGeneration {
    /// Flat `settings` block with snake_case keys.
    Legacy,
    /// `v2Settings.prices` block with camelCase keys.
    Current,
}

impl ProtocolGeneration {
    /// Number of blocks a storage price is charged over per displayed month.
    ///
    /// Both generations quote storage in hastings per byte per block, so the
    /// net multiplier is currently the same for each.
    pub fn blocks_per_month(self) -> u64 {
        match self {
            ProtocolGeneration::Legacy => BLOCKS_PER_MONTH,
            ProtocolGeneration::Current => BLOCKS_PER_MONTH,
        }
    }
}

/// Parse a raw amount string into hastings.
///
/// Empty, non-numeric and negative input all yield `0`. Fractional or
/// scientific notation (as produced when the upstream serializes a float)
/// is accepted and truncated toward zero.
pub fn parse_hastings(raw: &str) -> u128 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }

    if let Ok(value) = trimmed.parse::<u128>() {
        return value;
    }

    let parsed = trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed));

    match parsed {
        Ok(value) if value.is_sign_negative() => {
            debug!("Clamping negative raw amount {} to zero", trimmed);
            0
        }
        Ok(value) => value.trunc().to_u128().unwrap_or(0),
        Err(_) => {
            debug!("Treating non-numeric raw amount {:?} as zero", trimmed);
            0
        }
    }
}

/// Convert hastings to SC without rounding.
pub fn hastings_to_sc(hastings: u128) -> Decimal {
    let whole = hastings / HASTINGS_PER_SC;
    let frac = hastings % HASTINGS_PER_SC;

    // whole <= u128::MAX / 10^24 and frac < 10^24, both fit the 96-bit mantissa
    let whole = Decimal::try_from_i128_with_scale(whole as i128, 0).unwrap_or(Decimal::ZERO);
    let frac = Decimal::try_from_i128_with_scale(frac as i128, SC_SCALE).unwrap_or(Decimal::ZERO);

    whole.checked_add(frac).unwrap_or(whole).normalize()
}

/// Multiply a display value, saturating at `Decimal::MAX`.
///
/// An absurdly high price must still rank as the most expensive one, so an
/// overflow never collapses to zero.
fn saturating_scale(value: Decimal, factor: u64, hastings: u128) -> Decimal {
    value
        .checked_mul(Decimal::from(factor))
        .unwrap_or_else(|| {
            debug!("Display conversion overflowed for {} hastings, saturating", hastings);
            Decimal::MAX
        })
        .normalize()
}

fn scale_sc(hastings: u128, factor: u64) -> Decimal {
    saturating_scale(hastings_to_sc(hastings), factor, hastings)
}

/// Storage price in SC/TB/month from hastings per byte per block.
///
/// Saturates at `Decimal::MAX` when the amount is too large to display.
pub fn storage_price_from_hastings(hastings: u128, generation: ProtocolGeneration) -> Decimal {
    saturating_scale(
        scale_sc(hastings, BYTES_PER_TB),
        generation.blocks_per_month(),
        hastings,
    )
}

/// Bandwidth price in SC/TB from hastings per byte.
pub fn bandwidth_price_from_hastings(hastings: u128) -> Decimal {
    scale_sc(hastings, BYTES_PER_TB)
}

/// Convert a raw storage price (hastings/byte/block) to SC/TB/month.
pub fn storage_price_to_display(raw_price_per_byte_block: &str) -> Decimal {
    storage_price_from_hastings(
        parse_hastings(raw_price_per_byte_block),
        ProtocolGeneration::Current,
    )
}

/// Convert a raw bandwidth price (hastings/byte) to SC/TB.
pub fn bandwidth_price_to_display(raw_price_per_byte: &str) -> Decimal {
    bandwidth_price_from_hastings(parse_hastings(raw_price_per_byte))
}

/// Convert a raw hastings amount to SC.
pub fn contract_price_to_display(raw_hastings: &str) -> Decimal {
    hastings_to_sc(parse_hastings(raw_hastings))
}
