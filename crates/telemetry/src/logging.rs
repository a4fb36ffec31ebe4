//! Structured logging setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, for the long-running `watch` loop.
    #[default]
    Json,
    /// Compact human-readable lines on stderr, for one-shot commands.
    Compact,
}

/// Initialize structured logging with environment-based filtering.
///
/// # Arguments
/// * `log_level` - Optional filter override (e.g., "info", "dartsia_core=debug")
/// * `format` - Output format
pub fn init_logging(log_level: Option<&str>, format: LogFormat) -> anyhow::Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()?,
    }

    Ok(())
}
