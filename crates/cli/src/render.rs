//! Terminal rendering of explorer views.

use clap::ValueEnum;
use dartsia_client::{SearchResult, Snapshot};
use dartsia_core::storage::format_bytes;
use dartsia_core::chain::{format_block_time, format_hashrate};
use dartsia_core::{BlockStats, BlockSummary, Host, NetworkStats, TransactionSummary};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// Output format for list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Serialize)]
struct HostRow<'a> {
    public_key: &'a str,
    address: &'a str,
    region: &'a str,
    total_bytes: u64,
    used_bytes: u64,
    storage_price_sc_tb_month: Decimal,
    upload_price_sc_tb: Decimal,
    download_price_sc_tb: Decimal,
    contract_price_sc: Decimal,
    reliability: u8,
    version: &'a str,
    active: bool,
}

impl<'a> From<&'a Host> for HostRow<'a> {
    fn from(host: &'a Host) -> Self {
        Self {
            public_key: &host.id,
            address: &host.address,
            region: &host.region,
            total_bytes: host.total_bytes,
            used_bytes: host.used_bytes,
            storage_price_sc_tb_month: host.storage_price_per_tb_month,
            upload_price_sc_tb: host.upload_price_per_tb,
            download_price_sc_tb: host.download_price_per_tb,
            contract_price_sc: host.contract_price,
            reliability: host.reliability_score,
            version: &host.version,
            active: host.is_active,
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn sc(value: Decimal) -> String {
    format!("{} SC", value.round_dp(4).normalize())
}

/// Write any serializable view as pretty JSON.
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Write a host list.
pub fn write_hosts<W: Write>(out: &mut W, hosts: &[Host], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => write_json(out, hosts),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for host in hosts {
                writer.serialize(HostRow::from(host))?;
            }
            writer.flush()?;
            Ok(())
        }
        OutputFormat::Table => {
            writeln!(
                out,
                "{:<24} {:<30} {:<3} {:>11} {:>11} {:>12} {:>4} {:<6}",
                "HOST", "ADDRESS", "RG", "USED", "TOTAL", "SC/TB/MO", "REL", "ACTIVE"
            )?;
            for host in hosts {
                writeln!(
                    out,
                    "{:<24} {:<30} {:<3} {:>11} {:>11} {:>12} {:>4} {:<6}",
                    truncate(&host.id, 24),
                    truncate(&host.address, 30),
                    host.region,
                    format_bytes(host.used_bytes),
                    format_bytes(host.total_bytes),
                    host.storage_price_per_tb_month.round_dp(2),
                    host.reliability_score,
                    if host.is_active { "yes" } else { "no" }
                )?;
            }
            Ok(())
        }
    }
}

/// Write a single host in detail.
pub fn write_host<W: Write>(out: &mut W, host: &Host) -> anyhow::Result<()> {
    writeln!(out, "Host            {}", host.id)?;
    writeln!(out, "Address         {}", host.address)?;
    writeln!(out, "Region          {}", host.region)?;
    writeln!(out, "Version         {}", if host.version.is_empty() { "unknown" } else { &host.version })?;
    writeln!(out, "Status          {}", if host.online { "online" } else { "offline" })?;
    writeln!(out, "Active          {}", if host.is_active { "yes" } else { "no" })?;
    writeln!(out, "Contracts       {}", if host.accepting_contracts { "accepting" } else { "closed" })?;
    match host.last_seen {
        Some(seen) => writeln!(out, "Last seen       {}", seen.to_rfc3339())?,
        None => writeln!(out, "Last seen       never")?,
    }
    writeln!(out, "Total storage   {}", format_bytes(host.total_bytes))?;
    writeln!(out, "Used storage    {}", format_bytes(host.used_bytes))?;
    writeln!(out, "Free storage    {}", format_bytes(host.free_bytes))?;
    writeln!(out, "Storage price   {} SC/TB/mo", host.storage_price_per_tb_month.round_dp(2))?;
    writeln!(out, "Ingress price   {} SC/TB", host.upload_price_per_tb.round_dp(2))?;
    writeln!(out, "Egress price    {} SC/TB", host.download_price_per_tb.round_dp(2))?;
    writeln!(out, "Contract price  {}", sc(host.contract_price))?;
    writeln!(out, "Reliability     {}/100", host.reliability_score)?;
    Ok(())
}

/// Write a page of blocks as a table.
pub fn write_blocks<W: Write>(out: &mut W, blocks: &[BlockSummary]) -> anyhow::Result<()> {
    writeln!(out, "{:>9} {:<20} {:>5} {:>16} {:<25}", "HEIGHT", "ID", "TXS", "FEES", "TIME")?;
    for block in blocks {
        writeln!(
            out,
            "{:>9} {:<20} {:>5} {:>16} {:<25}",
            block.height,
            truncate(&block.id, 20),
            block.transaction_count,
            sc(block.total_fees),
            block.timestamp.map(|t| t.to_rfc3339()).unwrap_or_default()
        )?;
    }
    Ok(())
}

/// Write a single block in detail.
pub fn write_block<W: Write>(out: &mut W, block: &BlockSummary) -> anyhow::Result<()> {
    writeln!(out, "Block           {}", block.height)?;
    writeln!(out, "ID              {}", block.id)?;
    writeln!(out, "Parent          {}", block.parent_id.as_deref().unwrap_or("-"))?;
    if let Some(ts) = block.timestamp {
        writeln!(out, "Time            {}", ts.to_rfc3339())?;
    }
    writeln!(out, "Transactions    {}", block.transaction_count)?;
    writeln!(out, "Total fees      {}", sc(block.total_fees))?;
    writeln!(out, "Miner payout    {}", sc(block.miner_payout))?;
    Ok(())
}

/// Write a list of transactions as a table.
pub fn write_transactions<W: Write>(out: &mut W, txs: &[TransactionSummary]) -> anyhow::Result<()> {
    writeln!(out, "{:<20} {:<20} {:>9} {:>18} {:>14}", "ID", "TYPE", "HEIGHT", "VALUE", "FEE")?;
    for tx in txs {
        writeln!(
            out,
            "{:<20} {:<20} {:>9} {:>18} {:>14}",
            truncate(&tx.id, 20),
            truncate(&tx.kind.label(), 20),
            tx.height.map(|h| h.to_string()).unwrap_or_else(|| "-".to_string()),
            sc(tx.output_value),
            sc(tx.fee)
        )?;
    }
    Ok(())
}

/// Write a single transaction in detail.
pub fn write_transaction<W: Write>(out: &mut W, tx: &TransactionSummary) -> anyhow::Result<()> {
    writeln!(out, "Transaction     {}", tx.id)?;
    writeln!(out, "Type            {}", tx.kind.label())?;
    if let Some(height) = tx.height {
        writeln!(out, "Height          {}", height)?;
    }
    writeln!(out, "Inputs          {}", tx.input_count)?;
    writeln!(out, "Outputs         {}", tx.output_count)?;
    writeln!(out, "Output value    {}", sc(tx.output_value))?;
    writeln!(out, "Miner fee       {}", sc(tx.fee))?;
    Ok(())
}

fn write_network_stats<W: Write>(out: &mut W, title: &str, stats: &NetworkStats) -> anyhow::Result<()> {
    writeln!(out, "{}", title)?;
    writeln!(out, "  Hosts           {} ({} active)", stats.total_hosts, stats.active_hosts)?;
    writeln!(
        out,
        "  Storage         {} used of {}",
        format_bytes(stats.used_storage),
        format_bytes(stats.total_storage)
    )?;
    writeln!(out, "  Storage price   {} SC/TB/mo", stats.storage_price.round_dp(2))?;
    if let Some(height) = stats.block_height {
        writeln!(out, "  Block height    {}", height)?;
    }
    if let Some(ts) = stats.last_block_time {
        writeln!(out, "  Last block      {}", ts.to_rfc3339())?;
    }
    Ok(())
}

/// Write derived, reported and block statistics from one refresh.
pub fn write_snapshot<W: Write>(out: &mut W, snapshot: &Snapshot) -> anyhow::Result<()> {
    write_network_stats(out, "Derived from hosts", &snapshot.derived)?;
    writeln!(out, "  Listed hosts    {}", snapshot.listing_hosts)?;
    if let Some(reported) = &snapshot.reported {
        write_network_stats(out, "Reported by backend", reported)?;
    }
    if let Some(blocks) = &snapshot.block_stats {
        write_block_stats(out, blocks)?;
    }
    Ok(())
}

fn write_block_stats<W: Write>(out: &mut W, stats: &BlockStats) -> anyhow::Result<()> {
    writeln!(out, "Block production")?;
    if let Some(height) = stats.latest_block {
        writeln!(out, "  Latest block    {}", height)?;
    }
    if let Some(time) = stats.average_block_time {
        writeln!(out, "  Avg block time  {}", format_block_time(time))?;
    }
    if let Some(fees) = stats.average_block_fees {
        writeln!(out, "  Avg block fees  {:.2} SC", fees)?;
    }
    if let Some(hashrate) = stats.hashrate {
        writeln!(out, "  Hashrate        {}", format_hashrate(hashrate))?;
    }
    if let Some(difficulty) = stats.difficulty {
        writeln!(out, "  Difficulty      {}", difficulty.normalize())?;
    }
    Ok(())
}

/// Write whatever a search resolved to.
pub fn write_search<W: Write>(out: &mut W, result: &SearchResult) -> anyhow::Result<()> {
    match result {
        SearchResult::Block(block) => write_block(out, block),
        SearchResult::Transaction(tx) => write_transaction(out, tx),
        SearchResult::Host(host) => write_host(out, host),
        SearchResult::NotFound { query, kind } => {
            writeln!(out, "Nothing found for {:?} (classified as {})", query, kind)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dartsia_core::QueryKind;

    fn host() -> Host {
        Host {
            id: "ed25519:0123456789abcdef0123456789abcdef".to_string(),
            address: "host.example.com:9982".to_string(),
            total_bytes: 8_000_000_000_000,
            used_bytes: 6_000_000_000_000,
            free_bytes: 2_000_000_000_000,
            storage_price_per_tb_month: Decimal::from(216),
            contract_price: Decimal::new(2, 1),
            download_price_per_tb: Decimal::from(3),
            upload_price_per_tb: Decimal::ONE,
            reliability_score: 87,
            version: "1.5.9".to_string(),
            region: "DE".to_string(),
            accepting_contracts: true,
            online: true,
            last_seen: None,
            is_active: true,
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_host_table() {
        let out = render(|w| write_hosts(w, &[host()], OutputFormat::Table));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("HOST"));
        assert!(lines[1].starts_with("ed25519:0123456789abc..."));
        assert!(lines[1].contains("6.00 TB"));
        assert!(lines[1].contains("8.00 TB"));
        assert!(lines[1].contains("216"));
    }

    #[test]
    fn test_host_csv() {
        let out = render(|w| write_hosts(w, &[host(), host()], OutputFormat::Csv));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("public_key,address,region,total_bytes"));
        assert!(lines[1].contains(",DE,8000000000000,6000000000000,"));
    }

    #[test]
    fn test_host_json() {
        let out = render(|w| write_hosts(w, &[host()], OutputFormat::Json));
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["region"], "DE");
        assert_eq!(parsed[0]["usedBytes"], 6_000_000_000_000u64);
        assert_eq!(parsed[0]["isActive"], true);
    }

    #[test]
    fn test_not_found_search() {
        let out = render(|w| {
            write_search(
                w,
                &SearchResult::NotFound {
                    query: "nope".to_string(),
                    kind: QueryKind::Unknown,
                },
            )
        });
        assert_eq!(out.trim(), "Nothing found for \"nope\" (classified as unknown)");
    }

    #[test]
    fn test_block_stats_section() {
        let stats = BlockStats {
            latest_block: Some(512_345),
            average_block_time: Some(Decimal::from(588)),
            average_block_fees: Some(Decimal::new(125, 2)),
            difficulty: None,
            hashrate: Some(Decimal::from(2_500_000_000_000_000u64)),
        };
        let out = render(|w| write_block_stats(w, &stats));
        assert!(out.starts_with("Block production"));
        assert!(out.contains("Latest block    512345"));
        assert!(out.contains("Avg block time  9.8 min"));
        assert!(out.contains("Avg block fees  1.25 SC"));
        assert!(out.contains("Hashrate        2.50 PH/s"));
        assert!(!out.contains("Difficulty"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
