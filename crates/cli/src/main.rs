//! Terminal explorer for the Sia storage network.

mod render;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use dartsia_client::{
    ClientConfig, ExplorerSource, HttpExplorer, InMemoryCache, NoCache, ResponseCache,
    SearchResolver, SnapshotProcessor,
};
use dartsia_core::raw::parse_hosts;
use dartsia_core::{classify, BlockSummary, FreshnessWindow, Host, HostNormalizer, TransactionSummary};
use dartsia_telemetry::{init_logging, LogFormat, Metrics};
use render::OutputFormat;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(name = "dartsia")]
#[command(about = "Explorer for Sia hosts, blocks and transactions")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Explorer server root URL
    #[arg(long, global = true, default_value = "http://localhost:8080")]
    api_url: String,

    /// API key sent as x-api-key
    #[arg(long, global = true, env = "DARTSIA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Hours since last contact for a host to count as active
    #[arg(long, global = true, default_value = "48")]
    active_window_hours: u32,

    /// Hours since last contact for a host to be listed
    #[arg(long, global = true, default_value = "168")]
    listing_window_hours: u32,

    /// Response cache TTL in seconds (0 disables caching)
    #[arg(long, global = true, default_value = "30")]
    cache_ttl_seconds: u64,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, default_value = "15")]
    timeout_seconds: u64,
}

impl GlobalArgs {
    fn active_window(&self) -> FreshnessWindow {
        FreshnessWindow::from_hours(self.active_window_hours)
    }

    fn listing_window(&self) -> FreshnessWindow {
        FreshnessWindow::from_hours(self.listing_window_hours)
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl_seconds),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List hosts
    Hosts {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Only hosts seen within the active window
        #[arg(long, conflicts_with = "all")]
        active: bool,

        /// Include hosts outside the listing window
        #[arg(long)]
        all: bool,
    },
    /// Show one host by public key
    Host {
        key: String,

        #[arg(long)]
        json: bool,
    },
    /// List recent blocks
    Blocks {
        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "20")]
        limit: u32,

        #[arg(long)]
        json: bool,
    },
    /// Show one block by height or id
    Block {
        id: String,

        #[arg(long)]
        json: bool,
    },
    /// Show one transaction, or the most recent ones with `recent`
    Tx {
        id: String,

        /// Number of transactions when listing recent ones
        #[arg(long, default_value = "20")]
        limit: u32,

        #[arg(long)]
        json: bool,
    },
    /// Show network statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Search by block height, hash or host key
    Search {
        query: String,

        #[arg(long)]
        json: bool,
    },
    /// Classify a search query without contacting the server
    Classify { query: String },
    /// Normalize a saved /hosts payload
    Normalize {
        /// Path to the JSON payload
        #[arg(long)]
        input: String,

        /// Instant freshness is measured from (defaults to now)
        #[arg(long)]
        reference_time: Option<DateTime<Utc>>,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Poll the explorer and serve Prometheus metrics
    Watch {
        /// Poll interval in seconds
        #[arg(long, default_value = "60")]
        poll_interval_seconds: u64,

        /// Metrics bind address
        #[arg(long, default_value = "0.0.0.0:9090")]
        metrics_bind_address: String,

        /// Sample output path for audit logs
        #[arg(long)]
        sample_output_path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_format = match cli.command {
        Commands::Watch { .. } => LogFormat::Json,
        _ => LogFormat::Compact,
    };
    init_logging(cli.global.log_level.as_deref(), log_format)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // Offline commands never build a client.
    match &cli.command {
        Commands::Classify { query } => {
            writeln!(out, "{}", classify(query))?;
            return Ok(());
        }
        Commands::Normalize {
            input,
            reference_time,
            format,
        } => {
            let reference = reference_time.unwrap_or_else(Utc::now);
            let hosts = normalize_file(input, reference, cli.global.active_window())?;
            render::write_hosts(&mut out, &hosts, *format)?;
            return Ok(());
        }
        _ => {}
    }

    let metrics = Metrics::new()?;
    let explorer = build_explorer(&cli.global, metrics.clone())?;
    let global = &cli.global;

    match cli.command {
        Commands::Hosts { format, active, all } => {
            let now = Utc::now();
            let raw = explorer.hosts().await?;
            let hosts: Vec<Host> = HostNormalizer::new(now, global.active_window())
                .normalize_all(&raw)
                .into_iter()
                .filter(|h| {
                    if active {
                        h.is_active
                    } else {
                        all || h.is_fresh(now, global.listing_window())
                    }
                })
                .collect();
            debug!("Listing {} of {} hosts", hosts.len(), raw.len());
            render::write_hosts(&mut out, &hosts, format)?;
        }
        Commands::Host { key, json } => {
            let raw = explorer.hosts().await?;
            let found = raw
                .iter()
                .find(|h| h.public_key.as_deref() == Some(key.as_str()))
                .ok_or_else(|| anyhow::anyhow!("host {} not found", key))?;
            let host = HostNormalizer::new(Utc::now(), global.active_window()).normalize(found);
            if json {
                render::write_json(&mut out, &host)?;
            } else {
                render::write_host(&mut out, &host)?;
            }
        }
        Commands::Blocks { page, limit, json } => {
            let blocks: Vec<BlockSummary> = explorer
                .blocks(page, limit)
                .await?
                .iter()
                .map(BlockSummary::from_raw)
                .collect();
            if json {
                render::write_json(&mut out, &blocks)?;
            } else {
                render::write_blocks(&mut out, &blocks)?;
            }
        }
        Commands::Block { id, json } => {
            let block = BlockSummary::from_raw(&explorer.block(&id).await?);
            if json {
                render::write_json(&mut out, &block)?;
            } else {
                render::write_block(&mut out, &block)?;
            }
        }
        Commands::Tx { id, limit, json } => {
            if id == "recent" {
                let txs: Vec<TransactionSummary> = explorer
                    .recent_transactions(limit)
                    .await?
                    .iter()
                    .map(TransactionSummary::from_raw)
                    .collect();
                if json {
                    render::write_json(&mut out, &txs)?;
                } else {
                    render::write_transactions(&mut out, &txs)?;
                }
            } else {
                let tx = TransactionSummary::from_raw(&explorer.transaction(&id).await?);
                if json {
                    render::write_json(&mut out, &tx)?;
                } else {
                    render::write_transaction(&mut out, &tx)?;
                }
            }
        }
        Commands::Stats { json } => {
            let processor = SnapshotProcessor::new(
                explorer.clone(),
                metrics,
                global.active_window(),
                global.listing_window(),
                None,
            );
            let snapshot = processor.refresh(Utc::now()).await?;
            if json {
                render::write_json(&mut out, &snapshot)?;
            } else {
                render::write_snapshot(&mut out, &snapshot)?;
            }
        }
        Commands::Search { query, json } => {
            let normalizer = HostNormalizer::new(Utc::now(), global.active_window());
            let result = SearchResolver::new(explorer.as_ref(), normalizer)
                .resolve(&query)
                .await?;
            if json {
                render::write_json(&mut out, &result)?;
            } else {
                render::write_search(&mut out, &result)?;
            }
        }
        Commands::Watch {
            poll_interval_seconds,
            metrics_bind_address,
            sample_output_path,
        } => {
            drop(out);
            run_watch(
                explorer,
                metrics,
                global,
                poll_interval_seconds,
                &metrics_bind_address,
                sample_output_path,
            )
            .await?;
        }
        Commands::Classify { .. } | Commands::Normalize { .. } => {}
    }

    Ok(())
}

fn build_explorer(global: &GlobalArgs, metrics: Metrics) -> anyhow::Result<Arc<HttpExplorer>> {
    let cache: Arc<dyn ResponseCache> = if global.cache_ttl_seconds == 0 {
        Arc::new(NoCache)
    } else {
        Arc::new(InMemoryCache::new())
    };
    Ok(Arc::new(HttpExplorer::new(&global.client_config(), cache, metrics)?))
}

fn normalize_file(
    path: &str,
    reference: DateTime<Utc>,
    window: FreshnessWindow,
) -> anyhow::Result<Vec<Host>> {
    let payload: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let raw = parse_hosts(payload);
    info!("Normalizing {} hosts from {}", raw.len(), path);
    Ok(HostNormalizer::new(reference, window).normalize_all(&raw))
}

async fn run_watch(
    explorer: Arc<HttpExplorer>,
    metrics: Metrics,
    global: &GlobalArgs,
    poll_interval: u64,
    metrics_addr: &str,
    sample_output_path: Option<String>,
) -> anyhow::Result<()> {
    info!("Starting Dartsia explorer watch loop against {}", global.api_url);

    let processor = SnapshotProcessor::new(
        explorer,
        metrics.clone(),
        global.active_window(),
        global.listing_window(),
        sample_output_path,
    );

    start_metrics_server(metrics_addr, metrics.clone()).await?;

    let poll_duration = Duration::from_secs(poll_interval);
    let mut last_height: Option<u64> = None;

    loop {
        match processor.refresh(Utc::now()).await {
            Ok(snapshot) => match snapshot.tip.as_ref().map(|t| t.height) {
                Some(height) if last_height != Some(height) => {
                    info!("Chain tip advanced to {}", height);
                    last_height = Some(height);
                }
                Some(height) => debug!("No new blocks, tip: {}", height),
                None => debug!("Chain tip unavailable"),
            },
            Err(e) => {
                metrics.inc_refresh_errors();
                error!("Refresh failed: {}", e);
            }
        }

        tokio::select! {
            _ = sleep(poll_duration) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down watch loop");
                return Ok(());
            }
        }
    }
}

async fn start_metrics_server(addr: &str, metrics: Metrics) -> anyhow::Result<()> {
    use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};

    let metrics = Arc::new(metrics);

    async fn metrics_handler(
        State(metrics): State<Arc<Metrics>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match metrics.gather() {
            Ok(body) => Ok((StatusCode::OK, body)),
            Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Metrics server listening on http://{}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}
